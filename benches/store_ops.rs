use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use medisynth::domain::{GalleryFiltersPatch, SyntheticSample};
use medisynth::store::Store;

const SAMPLE_COUNT: usize = 10_000;

fn sample(index: usize) -> SyntheticSample {
    SyntheticSample {
        id: format!("sample-{index}"),
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        modality: "fundus".to_string(),
        image_url: format!("https://synth.local/samples/{index}.png"),
        confidence_score: (index % 100) as f64 / 100.0,
        is_synthetic: true,
        demographics: None,
        medical_metadata: None,
    }
}

fn seeded_store() -> Store {
    let mut store = Store::new("Dr. Researcher");
    store.set_samples((0..SAMPLE_COUNT).map(sample).collect());
    store
}

fn bench_add_samples(c: &mut Criterion) {
    let batch: Vec<SyntheticSample> = (0..500).map(sample).collect();
    c.bench_with_input(
        BenchmarkId::new("add_samples_prepend", batch.len()),
        &batch,
        |b, batch| {
            b.iter_batched(
                seeded_store,
                |mut store| store.add_samples(black_box(batch.clone())),
                criterion::BatchSize::SmallInput,
            );
        },
    );
}

fn bench_training_log_cap(c: &mut Criterion) {
    c.bench_function("add_training_log_at_cap", |b| {
        let mut store = Store::new("Dr. Researcher");
        for index in 0..600 {
            store.add_training_log(format!("warmup line {index}"));
        }
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            store.add_training_log(black_box(format!("epoch line {counter}")));
        });
    });
}

fn bench_filtered_samples(c: &mut Criterion) {
    let mut store = seeded_store();
    store.set_gallery_filters(GalleryFiltersPatch {
        min_confidence: Some(0.5),
        ..GalleryFiltersPatch::default()
    });
    c.bench_with_input(
        BenchmarkId::new("filtered_samples", SAMPLE_COUNT),
        &store,
        |b, store| {
            b.iter(|| black_box(store.filtered_samples().len()));
        },
    );
}

criterion_group!(
    benches,
    bench_add_samples,
    bench_training_log_cap,
    bench_filtered_samples
);
criterion_main!(benches);
