//! Dataset records for uploads and versioned generation runs.

use serde::{Deserialize, Serialize};

/// Processing state of an uploaded dataset, advancing forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Uploading,
    Processing,
    Completed,
    Error,
}

/// An uploaded source dataset tracked by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub file_count: u64,
    pub total_size_bytes: u64,
    pub upload_date: String,
    pub status: ProcessingStatus,
    pub processed_count: u64,
}

/// Acknowledgement returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
    pub status: String,
    pub message: String,
}

/// One entry in the generated-dataset version ledger, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: String,
    pub timestamp: String,
    pub samples_count: u64,
    pub fidelity_score: f64,
    pub bias_score: f64,
    pub changelog: String,
    pub author: String,
}

/// Author-supplied fields of a new dataset version; id and timestamp are
/// assigned when the entry is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDatasetVersion {
    pub samples_count: u64,
    pub fidelity_score: f64,
    pub bias_score: f64,
    pub changelog: String,
    pub author: String,
}
