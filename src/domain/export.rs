//! Export queue records.

use serde::{Deserialize, Serialize};

/// Target format of an export task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "DICOM")]
    Dicom,
    #[serde(rename = "NIfTI")]
    Nifti,
    #[serde(rename = "PNG")]
    Png,
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "JSON")]
    Json,
}

/// Lifecycle of an export task; transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One queued export, newest first in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    pub id: String,
    pub format: ExportFormat,
    pub status: ExportStatus,
    /// Completion percentage in `0.0..=100.0`.
    pub progress: f64,
    pub timestamp: String,
    pub file_count: u64,
}

/// Partial update for [`ExportTask`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTaskPatch {
    pub status: Option<ExportStatus>,
    pub progress: Option<f64>,
}

impl ExportTask {
    /// Apply a shallow merge of `patch` onto this task.
    pub fn apply(&mut self, patch: &ExportTaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_keep_display_spellings() {
        assert_eq!(serde_json::to_string(&ExportFormat::Nifti).unwrap(), "\"NIfTI\"");
        assert_eq!(serde_json::to_string(&ExportFormat::Dicom).unwrap(), "\"DICOM\"");
        assert_eq!(serde_json::to_string(&ExportStatus::Pending).unwrap(), "\"pending\"");
    }
}
