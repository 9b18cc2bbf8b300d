//! The reactive store: single source of truth for all cross-page client
//! state.
//!
//! One `Store` exists per running client and is the sole owner of the
//! dashboard collections; consumers mutate it only through the named
//! operations here. Every mutation writes the persisted subset to disk and
//! notifies registered observers over a change channel. Operations are
//! infallible by contract: inputs are the caller's responsibility, a keyed
//! update that misses is a defined no-op, and persistence failures are
//! logged and swallowed.

mod persistence;
mod state;

pub use persistence::{PersistedState, PersistenceError, STATE_FILE_NAME, StatePersistence};
pub use state::{DashboardState, MAX_RESOURCE_SNAPSHOTS, MAX_TRAINING_LOGS};

use std::sync::mpsc::{self, Receiver, Sender};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::domain::{
    AlertPriority, AnalyticsMetrics, AuditLogEntry, Checkpoint, Dataset, DatasetVersion,
    ExportFormat, ExportStatus, ExportTask, ExportTaskPatch, GalleryFiltersPatch, HealthStatus,
    NewCheckpoint, NewDatasetVersion, PipelineConfigPatch, PipelineStep, ResourceSnapshot,
    ResourceUsagePatch, SamplePatch, SyntheticSample, SystemAlert, TrainingMetrics,
};

/// Which area of state a mutation touched, delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Samples,
    Analytics,
    TrainingProgress,
    ActiveDataset,
    RunFlags,
    CurrentStep,
    AuditLogs,
    PipelineConfig,
    GalleryFilters,
    TrainingLogs,
    Resources,
    Checkpoints,
    ExportTasks,
    DatasetVersions,
    ApiKeys,
    Alerts,
    SystemHealth,
    UiFlags,
}

/// The reactive store. Construct one per client; tests hold isolated
/// instances.
pub struct Store {
    state: DashboardState,
    audit_user: String,
    persistence: Option<StatePersistence>,
    observers: Vec<Sender<StateChange>>,
}

impl Store {
    /// A store without durable storage, starting from defaults.
    pub fn new(audit_user: impl Into<String>) -> Self {
        Self {
            state: DashboardState::default(),
            audit_user: audit_user.into(),
            persistence: None,
            observers: Vec::new(),
        }
    }

    /// A store backed by durable storage; the persisted subset is hydrated
    /// once, here. Hydration failure falls back to defaults.
    pub fn with_persistence(
        persistence: StatePersistence,
        audit_user: impl Into<String>,
    ) -> Self {
        let mut state = DashboardState::default();
        if let Some(snapshot) = persistence.hydrate() {
            state.pipeline_config = snapshot.pipeline_config;
            state.audit_logs = snapshot.audit_logs;
            state.current_step = snapshot.current_step;
            state.gallery_filters = snapshot.gallery_filters;
        }
        Self {
            state,
            audit_user: audit_user.into(),
            persistence: Some(persistence),
            observers: Vec::new(),
        }
    }

    /// Read-only view of the full state.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Register an observer; each mutation delivers one [`StateChange`].
    /// Dropped receivers are pruned on the next notification.
    pub fn subscribe(&mut self) -> Receiver<StateChange> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    // --- Replace operations ---

    pub fn set_samples(&mut self, samples: Vec<SyntheticSample>) {
        self.state.samples = samples;
        self.commit(StateChange::Samples);
    }

    /// Prepend freshly generated samples; newest batch first.
    pub fn add_samples(&mut self, samples: Vec<SyntheticSample>) {
        let mut merged = samples;
        merged.append(&mut self.state.samples);
        self.state.samples = merged;
        self.commit(StateChange::Samples);
    }

    pub fn set_analytics(&mut self, analytics: AnalyticsMetrics) {
        self.state.analytics = Some(analytics);
        self.commit(StateChange::Analytics);
    }

    pub fn set_training_progress(&mut self, progress: TrainingMetrics) {
        self.state.training_progress = Some(progress);
        self.commit(StateChange::TrainingProgress);
    }

    pub fn set_generating(&mut self, generating: bool) {
        self.state.is_generating = generating;
        self.commit(StateChange::RunFlags);
    }

    pub fn set_training(&mut self, training: bool) {
        self.state.is_training = training;
        self.commit(StateChange::RunFlags);
    }

    pub fn set_active_dataset(&mut self, dataset: Option<Dataset>) {
        self.state.active_dataset = dataset;
        self.commit(StateChange::ActiveDataset);
    }

    pub fn set_current_step(&mut self, step: PipelineStep) {
        self.state.current_step = step;
        self.commit(StateChange::CurrentStep);
    }

    pub fn set_tutorial_step(&mut self, step: Option<u32>) {
        self.state.tutorial_step = step;
        self.commit(StateChange::UiFlags);
    }

    pub fn set_help_tray_open(&mut self, open: bool) {
        self.state.help_tray_open = open;
        self.commit(StateChange::UiFlags);
    }

    // --- Merge operations ---

    pub fn set_pipeline_config(&mut self, patch: PipelineConfigPatch) {
        self.state.pipeline_config.apply(&patch);
        self.commit(StateChange::PipelineConfig);
    }

    pub fn set_gallery_filters(&mut self, patch: GalleryFiltersPatch) {
        self.state.gallery_filters.apply(&patch);
        self.commit(StateChange::GalleryFilters);
    }

    pub fn set_resource_usage(&mut self, patch: ResourceUsagePatch) {
        self.state.resource_usage.apply(&patch);
        self.commit(StateChange::Resources);
    }

    // --- Append-with-cap operations ---

    /// Append a training log line, keeping the most recent
    /// [`MAX_TRAINING_LOGS`] lines.
    pub fn add_training_log(&mut self, line: impl Into<String>) {
        self.state.training_logs.push(line.into());
        let len = self.state.training_logs.len();
        if len > MAX_TRAINING_LOGS {
            self.state.training_logs.drain(..len - MAX_TRAINING_LOGS);
        }
        self.commit(StateChange::TrainingLogs);
    }

    /// Record the current resource readings, keeping the most recent
    /// [`MAX_RESOURCE_SNAPSHOTS`] snapshots.
    pub fn add_resource_snapshot(&mut self) {
        self.state.resource_history.push(ResourceSnapshot {
            timestamp: now_timestamp(),
            usage: self.state.resource_usage.clone(),
        });
        let len = self.state.resource_history.len();
        if len > MAX_RESOURCE_SNAPSHOTS {
            self.state
                .resource_history
                .drain(..len - MAX_RESOURCE_SNAPSHOTS);
        }
        self.commit(StateChange::Resources);
    }

    // --- Prepend operations (id + timestamp synthesized, newest first) ---

    pub fn add_audit_log(&mut self, action: impl Into<String>, details: impl Into<String>) {
        let entry = AuditLogEntry {
            id: new_id(),
            timestamp: now_timestamp(),
            user: self.audit_user.clone(),
            action: action.into(),
            details: details.into(),
        };
        self.state.audit_logs.insert(0, entry);
        self.commit(StateChange::AuditLogs);
    }

    pub fn add_system_alert(
        &mut self,
        priority: AlertPriority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> String {
        let id = new_id();
        self.state.alerts.insert(
            0,
            SystemAlert {
                id: id.clone(),
                priority,
                title: title.into(),
                message: message.into(),
                timestamp: now_timestamp(),
                acknowledged: false,
            },
        );
        self.commit(StateChange::Alerts);
        id
    }

    pub fn add_export_task(&mut self, format: ExportFormat, file_count: u64) -> String {
        let id = new_id();
        self.state.export_tasks.insert(
            0,
            ExportTask {
                id: id.clone(),
                format,
                status: ExportStatus::Pending,
                progress: 0.0,
                timestamp: now_timestamp(),
                file_count,
            },
        );
        self.commit(StateChange::ExportTasks);
        id
    }

    pub fn add_dataset_version(&mut self, version: NewDatasetVersion) -> String {
        let id = new_id();
        self.state.dataset_versions.insert(
            0,
            DatasetVersion {
                id: id.clone(),
                timestamp: now_timestamp(),
                samples_count: version.samples_count,
                fidelity_score: version.fidelity_score,
                bias_score: version.bias_score,
                changelog: version.changelog,
                author: version.author,
            },
        );
        self.commit(StateChange::DatasetVersions);
        id
    }

    pub fn add_api_key(&mut self, name: impl Into<String>, key: impl Into<String>) -> String {
        let id = new_id();
        self.state.api_keys.insert(
            0,
            crate::domain::ApiKey {
                id: id.clone(),
                name: name.into(),
                key: key.into(),
                created: now_timestamp(),
                last_used: None,
                status: crate::domain::KeyStatus::Active,
            },
        );
        self.commit(StateChange::ApiKeys);
        id
    }

    pub fn add_checkpoint(&mut self, checkpoint: NewCheckpoint) -> String {
        let id = new_id();
        self.state.checkpoints.insert(
            0,
            Checkpoint {
                id: id.clone(),
                epoch: checkpoint.epoch,
                timestamp: now_timestamp(),
                fid_score: checkpoint.fid_score,
                accuracy: checkpoint.accuracy,
                is_best: checkpoint.is_best,
            },
        );
        self.commit(StateChange::Checkpoints);
        id
    }

    // --- Keyed updates (a miss is a silent no-op) ---

    pub fn update_sample(&mut self, id: &str, patch: SamplePatch) {
        if let Some(sample) = self.state.samples.iter_mut().find(|s| s.id == id) {
            sample.apply(&patch);
            self.commit(StateChange::Samples);
        }
    }

    pub fn update_export_task(&mut self, id: &str, patch: ExportTaskPatch) {
        if let Some(task) = self.state.export_tasks.iter_mut().find(|t| t.id == id) {
            task.apply(&patch);
            self.commit(StateChange::ExportTasks);
        }
    }

    pub fn acknowledge_alert(&mut self, id: &str) {
        if let Some(alert) = self.state.alerts.iter_mut().find(|a| a.id == id) {
            alert.acknowledged = true;
            self.commit(StateChange::Alerts);
        }
    }

    pub fn set_component_status(
        &mut self,
        id: &str,
        status: HealthStatus,
        latency_ms: Option<u32>,
    ) {
        let health = &mut self.state.system_health;
        if let Some(component) = health.components.iter_mut().find(|c| c.id == id) {
            component.status = status;
            component.latency_ms = latency_ms;
            component.last_checked = now_timestamp();
            health.overall = health
                .components
                .iter()
                .map(|c| c.status)
                .max_by_key(|status| severity_rank(*status))
                .unwrap_or(HealthStatus::Healthy);
            self.commit(StateChange::SystemHealth);
        }
    }

    pub fn revoke_api_key(&mut self, id: &str) {
        if let Some(key) = self.state.api_keys.iter_mut().find(|k| k.id == id) {
            key.status = crate::domain::KeyStatus::Revoked;
            self.commit(StateChange::ApiKeys);
        }
    }

    // --- Reset ---

    /// Restore the run state to defaults: flags, pipeline config, resource
    /// readings and history, samples, gallery filters, training logs and
    /// progress, checkpoints, export queue, alerts, tutorial/help flags.
    ///
    /// Audit logs, analytics, the active dataset, dataset versions, API
    /// keys, system health and the current step all survive; the audit
    /// trail in particular must outlive a reset for compliance.
    pub fn reset_pipeline(&mut self) {
        let defaults = DashboardState::default();
        let state = &mut self.state;
        state.is_training = defaults.is_training;
        state.is_generating = defaults.is_generating;
        state.training_progress = defaults.training_progress;
        state.pipeline_config = defaults.pipeline_config;
        state.resource_usage = defaults.resource_usage;
        state.resource_history = defaults.resource_history;
        state.samples = defaults.samples;
        state.gallery_filters = defaults.gallery_filters;
        state.training_logs = defaults.training_logs;
        state.checkpoints = defaults.checkpoints;
        state.export_tasks = defaults.export_tasks;
        state.alerts = defaults.alerts;
        state.tutorial_step = defaults.tutorial_step;
        state.help_tray_open = defaults.help_tray_open;
        self.commit(StateChange::RunFlags);
    }

    // --- Reads ---

    /// Samples passing the current gallery filters, in stored order.
    pub fn filtered_samples(&self) -> Vec<&SyntheticSample> {
        let filters = &self.state.gallery_filters;
        self.state
            .samples
            .iter()
            .filter(|sample| {
                if sample.confidence_score < filters.min_confidence {
                    return false;
                }
                let metadata = sample.medical_metadata.as_ref();
                if filters.flagged_only
                    && metadata.and_then(|m| m.flagged) != Some(true)
                {
                    return false;
                }
                if let Some(condition) = &filters.condition
                    && metadata.and_then(|m| m.disease_type.as_ref()) != Some(condition)
                {
                    return false;
                }
                if let Some(severity) = &filters.severity
                    && metadata.and_then(|m| m.severity.as_ref()) != Some(severity)
                {
                    return false;
                }
                if let Some(gender) = filters.gender
                    && sample.demographics.as_ref().map(|d| d.gender) != Some(gender)
                {
                    return false;
                }
                true
            })
            .collect()
    }

    fn commit(&mut self, change: StateChange) {
        if let Some(persistence) = &self.persistence {
            let snapshot = PersistedState {
                pipeline_config: self.state.pipeline_config.clone(),
                audit_logs: self.state.audit_logs.clone(),
                current_step: self.state.current_step,
                gallery_filters: self.state.gallery_filters.clone(),
            };
            if let Err(error) = persistence.save(&snapshot) {
                tracing::warn!("Failed to persist dashboard state: {error}");
            }
        }
        self.observers.retain(|observer| observer.send(change).is_ok());
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn severity_rank(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Healthy => 0,
        HealthStatus::Maintenance => 1,
        HealthStatus::Degraded => 2,
        HealthStatus::Down => 3,
    }
}
