//! Shared shape definitions for the dashboard domain: samples, metrics,
//! datasets, pipeline state, export queue, health and access records. No
//! behavior beyond patch application.

mod access;
mod dataset;
mod export;
mod health;
mod metrics;
mod pipeline;
mod sample;

pub use access::{ApiKey, AuditLogEntry, KeyStatus};
pub use dataset::{Dataset, DatasetVersion, NewDatasetVersion, ProcessingStatus, UploadResponse};
pub use export::{ExportFormat, ExportStatus, ExportTask, ExportTaskPatch};
pub use health::{AlertPriority, ComponentStatus, HealthStatus, SystemAlert, SystemHealth};
pub use metrics::{
    AnalyticsMetrics, BiasMetrics, FidelityMetrics, PrivacyMetrics, TrainingMetrics,
};
pub use pipeline::{
    AgeRange, Checkpoint, GalleryFilters, GalleryFiltersPatch, NewCheckpoint, PipelineConfig,
    PipelineConfigPatch, PipelineStep, ResourceSnapshot, ResourceUsage, ResourceUsagePatch,
    SeverityMix,
};
pub use sample::{
    Demographics, DrLevel, Ethnicity, Gender, MedicalMetadata, PatientData, SamplePatch,
    SyntheticSample,
};
