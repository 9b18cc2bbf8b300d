//! The full dashboard state owned by the store.

use serde::{Deserialize, Serialize};

use crate::domain::{
    AnalyticsMetrics, ApiKey, AuditLogEntry, Checkpoint, Dataset, DatasetVersion, ExportTask,
    GalleryFilters, HealthStatus, PipelineConfig, PipelineStep, ResourceSnapshot, ResourceUsage,
    SyntheticSample, SystemAlert, SystemHealth, TrainingMetrics,
};

/// Maximum retained training log lines; oldest dropped first.
pub const MAX_TRAINING_LOGS: usize = 500;
/// Maximum retained resource snapshots; oldest dropped first.
pub const MAX_RESOURCE_SNAPSHOTS: usize = 100;

/// Every piece of cross-page client state. One instance per running client,
/// owned by the store and mutated only through its operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub samples: Vec<SyntheticSample>,
    pub analytics: Option<AnalyticsMetrics>,
    pub training_progress: Option<TrainingMetrics>,
    pub active_dataset: Option<Dataset>,
    pub is_generating: bool,
    pub is_training: bool,
    pub current_step: PipelineStep,
    pub audit_logs: Vec<AuditLogEntry>,
    pub pipeline_config: PipelineConfig,
    pub gallery_filters: GalleryFilters,
    pub training_logs: Vec<String>,
    pub resource_usage: ResourceUsage,
    pub resource_history: Vec<ResourceSnapshot>,
    pub checkpoints: Vec<Checkpoint>,
    pub export_tasks: Vec<ExportTask>,
    pub dataset_versions: Vec<DatasetVersion>,
    pub api_keys: Vec<ApiKey>,
    pub alerts: Vec<SystemAlert>,
    pub system_health: SystemHealth,
    pub tutorial_step: Option<u32>,
    pub help_tray_open: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            analytics: None,
            training_progress: None,
            active_dataset: None,
            is_generating: false,
            is_training: false,
            current_step: PipelineStep::default(),
            audit_logs: Vec::new(),
            pipeline_config: PipelineConfig::default(),
            gallery_filters: GalleryFilters::default(),
            training_logs: Vec::new(),
            resource_usage: ResourceUsage::default(),
            resource_history: Vec::new(),
            checkpoints: Vec::new(),
            export_tasks: Vec::new(),
            dataset_versions: Vec::new(),
            api_keys: Vec::new(),
            alerts: Vec::new(),
            system_health: default_system_health(),
            tutorial_step: None,
            help_tray_open: false,
        }
    }
}

/// Monitored backend components, all assumed healthy until probed.
fn default_system_health() -> SystemHealth {
    let component = |id: &str, name: &str| crate::domain::ComponentStatus {
        id: id.to_string(),
        name: name.to_string(),
        status: HealthStatus::Healthy,
        latency_ms: None,
        last_checked: String::new(),
    };
    SystemHealth {
        overall: HealthStatus::Healthy,
        components: vec![
            component("api-gateway", "API Gateway"),
            component("gpu-cluster", "GPU Cluster"),
            component("db-primary", "Metadata Database"),
            component("storage-cold", "Cold Storage"),
        ],
    }
}
