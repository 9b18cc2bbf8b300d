//! End-to-end contracts for the store: retention rules, reset scope,
//! persistence across instances.

use medisynth::domain::{GalleryFiltersPatch, PipelineConfigPatch, PipelineStep};
use medisynth::store::{
    MAX_RESOURCE_SNAPSHOTS, MAX_TRAINING_LOGS, STATE_FILE_NAME, StatePersistence, Store,
};
use tempfile::tempdir;

#[test]
fn audit_trail_is_newest_first_and_unbounded() {
    let mut store = Store::new("Dr. Researcher");
    for index in 0..600 {
        store.add_audit_log(format!("Action {index}"), "details");
    }
    let logs = &store.state().audit_logs;
    assert_eq!(logs.len(), 600);
    assert_eq!(logs[0].action, "Action 599");
    assert_eq!(logs[599].action, "Action 0");
    assert!(logs.iter().all(|entry| entry.user == "Dr. Researcher"));
}

#[test]
fn training_logs_keep_only_the_most_recent_500() {
    let mut store = Store::new("Dr. Researcher");
    for index in 0..(MAX_TRAINING_LOGS + 40) {
        store.add_training_log(format!("epoch line {index}"));
    }
    let logs = &store.state().training_logs;
    assert_eq!(logs.len(), MAX_TRAINING_LOGS);
    assert_eq!(logs[0], "epoch line 40");
    assert_eq!(logs[MAX_TRAINING_LOGS - 1], "epoch line 539");
}

#[test]
fn resource_history_is_capped_at_100_snapshots() {
    let mut store = Store::new("Dr. Researcher");
    for _ in 0..(MAX_RESOURCE_SNAPSHOTS + 25) {
        store.add_resource_snapshot();
    }
    assert_eq!(store.state().resource_history.len(), MAX_RESOURCE_SNAPSHOTS);
}

#[test]
fn reset_preserves_audit_trail_and_restores_config_defaults() {
    let mut store = Store::new("Dr. Researcher");
    store.add_audit_log("GAN Training Started", "Researcher initiated model training.");
    store.set_training(true);
    store.set_pipeline_config(PipelineConfigPatch {
        batch_size: Some(256),
        noise_level: Some(0.4),
        ..PipelineConfigPatch::default()
    });
    store.add_training_log("epoch 1");

    store.reset_pipeline();

    let state = store.state();
    assert_eq!(state.audit_logs.len(), 1);
    assert!(!state.is_training);
    assert_eq!(state.pipeline_config.batch_size, 64);
    assert!(state.training_logs.is_empty());
}

#[test]
fn partial_config_patch_preserves_unrelated_fields() {
    let mut store = Store::new("Dr. Researcher");
    let before = store.state().pipeline_config.clone();
    store.set_pipeline_config(PipelineConfigPatch {
        batch_size: Some(64),
        ..PipelineConfigPatch::default()
    });
    let after = &store.state().pipeline_config;
    assert_eq!(after.batch_size, 64);
    assert_eq!(after.disease_prevalence, before.disease_prevalence);
    assert_eq!(after.noise_level, before.noise_level);
    assert_eq!(after.age_range, before.age_range);
    assert_eq!(after.severity_mix, before.severity_mix);
}

#[test]
fn persisted_subset_survives_a_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(STATE_FILE_NAME);

    {
        let mut store = Store::with_persistence(
            StatePersistence::at_path(&path),
            "Dr. Researcher",
        );
        store.set_current_step(PipelineStep::Analyze);
        store.set_pipeline_config(PipelineConfigPatch {
            batch_size: Some(16),
            ..PipelineConfigPatch::default()
        });
        store.set_gallery_filters(GalleryFiltersPatch {
            flagged_only: Some(true),
            ..GalleryFiltersPatch::default()
        });
        store.add_audit_log("Pipeline Reset", "All parameters reverted to default clinical state.");
        store.add_training_log("not persisted");
    }

    let revived = Store::with_persistence(StatePersistence::at_path(&path), "Dr. Researcher");
    let state = revived.state();
    assert_eq!(state.current_step, PipelineStep::Analyze);
    assert_eq!(state.pipeline_config.batch_size, 16);
    assert!(state.gallery_filters.flagged_only);
    assert_eq!(state.audit_logs[0].action, "Pipeline Reset");
    assert!(state.training_logs.is_empty());
}

#[test]
fn corrupt_persisted_record_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(STATE_FILE_NAME);
    std::fs::write(&path, b"\x00\x01 definitely not json").unwrap();

    let store = Store::with_persistence(StatePersistence::at_path(&path), "Dr. Researcher");
    assert_eq!(store.state().current_step, PipelineStep::Upload);
    assert!(store.state().audit_logs.is_empty());
}
