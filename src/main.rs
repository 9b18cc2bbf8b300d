//! Headless command-line driver for the MediSynth dashboard client.

use std::time::{Duration, Instant};

use medisynth::config::{self, AppConfig};
use medisynth::domain::{HealthStatus, PatientData};
use medisynth::gateway::api::{FilePart, MedicalApi};
use medisynth::gateway::ApiTokenStore;
use medisynth::logging;
use medisynth::resources::ResourceSampler;
use medisynth::store::{StatePersistence, Store};
use medisynth::stream::TrainingStreamSubscriber;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let Some((command, rest)) = args.split_first() else {
        println!("{}", help_text());
        return Ok(());
    };
    match command.as_str() {
        "-h" | "--help" | "help" => {
            println!("{}", help_text());
            Ok(())
        }
        "status" => cmd_status(),
        "login" => cmd_login(rest),
        "upload" => cmd_upload(rest),
        "generate" => cmd_generate(rest),
        "train" => cmd_train(),
        "analytics" => cmd_analytics(),
        other => Err(format!("Unknown command: {other}\n\n{}", help_text())),
    }
}

struct Context {
    config: AppConfig,
    api: MedicalApi,
    store: Store,
    tokens: Option<ApiTokenStore>,
}

fn build_context() -> Result<Context, String> {
    let config = config::load_or_default().map_err(|err| format!("Load config failed: {err}"))?;
    let api = MedicalApi::new(&config.api.base_url)
        .map_err(|err| format!("Invalid API base URL {}: {err}", config.api.base_url))?;
    let store = match StatePersistence::at_default_location() {
        Ok(persistence) => Store::with_persistence(persistence, config.audit.user.clone()),
        Err(err) => {
            tracing::warn!("State persistence disabled: {err}");
            Store::new(config.audit.user.clone())
        }
    };
    let tokens = match ApiTokenStore::new() {
        Ok(tokens) => Some(tokens),
        Err(err) => {
            tracing::warn!("Token store unavailable: {err}");
            None
        }
    };
    if let Some(tokens) = &tokens
        && let Ok(Some(token)) = tokens.get()
    {
        api.set_auth_token(Some(token));
    }
    Ok(Context {
        config,
        api,
        store,
        tokens,
    })
}

fn cmd_status() -> Result<(), String> {
    let mut context = build_context()?;
    let state = context.store.state();
    println!("Current step:   {}", state.current_step.label());
    println!("Training:       {}", state.is_training);
    println!("Generating:     {}", state.is_generating);
    println!("Audit entries:  {}", state.audit_logs.len());
    println!("Batch size:     {}", state.pipeline_config.batch_size);

    let started = Instant::now();
    match context.api.get_health() {
        Ok(health) => {
            let latency = started.elapsed().as_millis() as u32;
            context.store.set_component_status(
                "api-gateway",
                HealthStatus::Healthy,
                Some(latency),
            );
            let environment = health.environment.unwrap_or_else(|| "unknown".to_string());
            println!("Backend:        {} ({environment}, {latency}ms)", health.status);
        }
        Err(err) => {
            context
                .store
                .set_component_status("api-gateway", HealthStatus::Down, None);
            println!("Backend:        unreachable ({err})");
        }
    }
    println!(
        "Overall health: {:?}",
        context.store.state().system_health.overall
    );
    Ok(())
}

fn cmd_login(args: &[String]) -> Result<(), String> {
    let [username, password] = args else {
        return Err("Usage: medisynth login <username> <password>".to_string());
    };
    let context = build_context()?;
    let response = context
        .api
        .login(username, password)
        .map_err(|err| format!("Login failed: {err}"))?;
    context.api.set_auth_token(Some(response.access_token.clone()));
    persist_token(&context.tokens, &response.access_token);
    println!("Logged in; token stored.");
    Ok(())
}

fn persist_token(tokens: &Option<ApiTokenStore>, token: &str) {
    let Some(tokens) = tokens else {
        return;
    };
    if let Err(err) = tokens.set(token) {
        tracing::warn!("Token not persisted: {err}");
    }
}

fn cmd_upload(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("Usage: medisynth upload <file> [file ...]".to_string());
    }
    let mut files = Vec::with_capacity(args.len());
    for path in args {
        let bytes =
            std::fs::read(path).map_err(|err| format!("Read {path} failed: {err}"))?;
        let file_name = std::path::Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        files.push(FilePart {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            bytes,
        });
    }
    let mut context = build_context()?;
    context.store.add_audit_log(
        "Dataset Upload initiated",
        format!("Researcher started uploading {} files.", files.len()),
    );
    let response = context
        .api
        .upload_dataset(&files)
        .map_err(|err| format!("Upload failed: {err}"))?;
    println!(
        "Upload accepted: task {} ({})",
        response.task_id, response.status
    );
    Ok(())
}

fn content_type_for(file_name: &str) -> &'static str {
    let lowered = file_name.to_ascii_lowercase();
    if lowered.ends_with(".dcm") {
        "application/dicom"
    } else if lowered.ends_with(".png") {
        "image/png"
    } else if lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") {
        "image/jpeg"
    } else if lowered.ends_with(".csv") {
        "text/csv"
    } else {
        "application/octet-stream"
    }
}

fn cmd_generate(args: &[String]) -> Result<(), String> {
    let options = parse_generate_args(args)?;
    let mut context = build_context()?;
    context.store.set_generating(true);
    context.store.add_audit_log(
        "Synthetic Generation Started",
        format!("Batch generation of {} samples initiated.", options.count),
    );
    let patient = PatientData {
        age: options.age,
        condition: options.condition,
        scan_type: options.scan_type,
        metadata: None,
    };
    let result = context.api.generate_data(&patient, options.count);
    context.store.set_generating(false);
    let samples = result.map_err(|err| format!("Generation failed: {err}"))?;
    println!("Received {} samples:", samples.len());
    for sample in &samples {
        println!("  {}  confidence {:.2}", sample.id, sample.confidence_score);
    }
    context.store.add_samples(samples);
    Ok(())
}

struct GenerateOptions {
    count: u32,
    age: u32,
    condition: String,
    scan_type: String,
}

fn parse_generate_args(args: &[String]) -> Result<GenerateOptions, String> {
    let mut options = GenerateOptions {
        count: 1,
        age: 55,
        condition: "Diabetic Retinopathy".to_string(),
        scan_type: "Retinal".to_string(),
    };
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "--count" => options.count = parse_u32(args, &mut idx, "--count")?,
            "--age" => options.age = parse_u32(args, &mut idx, "--age")?,
            "--condition" => {
                options.condition = value_after(args, &mut idx, "--condition")?.to_string();
            }
            "--scan-type" => {
                options.scan_type = value_after(args, &mut idx, "--scan-type")?.to_string();
            }
            other => return Err(format!("Unknown argument: {other}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_u32(args: &[String], idx: &mut usize, flag: &str) -> Result<u32, String> {
    let value = value_after(args, idx, flag)?;
    value
        .parse::<u32>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn value_after<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    let value = args
        .get(*idx)
        .ok_or_else(|| format!("{flag} requires a value"))?;
    Ok(value)
}

fn cmd_train() -> Result<(), String> {
    let mut context = build_context()?;
    let mut subscriber = TrainingStreamSubscriber::new(context.api.get_training_stream_url());
    subscriber.set_auth_token(context.api.auth_token());
    let mut sampler = ResourceSampler::new();

    context.store.set_training(true);
    context
        .store
        .add_audit_log("GAN Training Started", "Researcher initiated model training.");

    let poll = Duration::from_millis(context.config.stream.poll_interval_ms.max(1));
    let mut last_epoch = 0u32;
    let mut last_snapshot = Instant::now();
    loop {
        subscriber.sync(&mut context.store);
        if !context.store.state().is_training && !subscriber.is_streaming() {
            break;
        }
        if last_snapshot.elapsed() >= Duration::from_secs(1) {
            let patch = sampler.sample();
            context.store.set_resource_usage(patch);
            context.store.add_resource_snapshot();
            last_snapshot = Instant::now();
        }
        if let Some(progress) = &context.store.state().training_progress
            && progress.epoch != last_epoch
        {
            last_epoch = progress.epoch;
            println!(
                "epoch {:>4}  loss {:.4}  accuracy {:.4}",
                progress.epoch, progress.loss, progress.accuracy
            );
        }
        std::thread::sleep(poll);
    }

    let state = context.store.state();
    match state.audit_logs.first() {
        Some(entry) if entry.action == medisynth::stream::TRAINING_COMPLETED_ACTION => {
            println!("Training completed after {last_epoch} epochs.");
        }
        _ => println!("Training stopped."),
    }
    Ok(())
}

fn cmd_analytics() -> Result<(), String> {
    let mut context = build_context()?;
    let analytics = context
        .api
        .get_analytics()
        .map_err(|err| format!("Analytics fetch failed: {err}"))?;
    println!("Samples generated: {}", analytics.total_samples_generated);
    println!("Active models:     {}", analytics.active_models);
    println!("Compute hours:     {:.1}", analytics.compute_usage_hours);
    match &analytics.privacy_metrics {
        Some(privacy) => println!("Privacy score:     {:.2}", privacy.average_privacy_score),
        None => println!(
            "Privacy score:     unavailable (fallback {:.2})",
            context.config.fallback_metrics.privacy_score
        ),
    }
    context.store.set_analytics(analytics);
    Ok(())
}

fn help_text() -> &'static str {
    "Usage: medisynth <command> [options]\n\n\
Commands:\n\
  status                       Show persisted pipeline state and probe backend health\n\
  login <username> <password>  Obtain and store an API token\n\
  upload <file> [file ...]     Upload dataset files\n\
  generate [options]           Request synthetic samples\n\
    --count <n>                Number of samples (default: 1)\n\
    --age <n>                  Patient age (default: 55)\n\
    --condition <text>         Medical condition (default: Diabetic Retinopathy)\n\
    --scan-type <text>         Scan type (default: Retinal)\n\
  train                        Start a training run and follow the metrics stream\n\
  analytics                    Fetch aggregate quality and privacy metrics\n\
  -h, --help                   Show this help\n"
}
