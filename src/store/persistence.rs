//! Durable storage for the persisted subset of dashboard state.
//!
//! One named JSON record holds {pipeline_config, audit_logs, current_step,
//! gallery_filters}. It is read once at startup and rewritten after every
//! mutation. Writes go through a temp file in the same directory followed by
//! an atomic rename so a crash never leaves a half-written record.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::domain::{AuditLogEntry, GalleryFilters, PipelineConfig, PipelineStep};

/// Filename of the persisted record under the `.medisynth` root.
pub const STATE_FILE_NAME: &str = "dashboard_state.json";

/// The subset of dashboard state that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub pipeline_config: PipelineConfig,
    pub audit_logs: Vec<AuditLogEntry>,
    pub current_step: PipelineStep,
    pub gallery_filters: GalleryFilters,
}

/// Errors that may occur while reading or writing the persisted record.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("No suitable directory for persisted state")]
    NoStateDir,
    #[error("Unable to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid persisted state at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize persisted state: {0}")]
    Serialize(serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads and writes the persisted record at a fixed path.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    path: PathBuf,
}

impl StatePersistence {
    /// Persist under the `.medisynth` root.
    pub fn at_default_location() -> Result<Self, PersistenceError> {
        let dir = app_dirs::app_root_dir().map_err(|error| match error {
            app_dirs::AppDirError::NoBaseDir => PersistenceError::NoStateDir,
            app_dirs::AppDirError::CreateDir { path, source } => {
                PersistenceError::CreateDir { path, source }
            }
        })?;
        Ok(Self {
            path: dir.join(STATE_FILE_NAME),
        })
    }

    /// Persist at an explicit path (used by tests).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record once at startup.
    ///
    /// A missing file is a normal first launch. A read or parse failure is
    /// logged and treated as absent; the store then starts from defaults.
    pub fn hydrate(&self) -> Option<PersistedState> {
        match self.load() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!("Discarding persisted state: {error}");
                None
            }
        }
    }

    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path).map_err(|source| PersistenceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let snapshot = serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    /// Replace the record atomically.
    pub fn save(&self, snapshot: &PersistedState) -> Result<(), PersistenceError> {
        let data = serde_json::to_vec_pretty(snapshot).map_err(PersistenceError::Serialize)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|source| PersistenceError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })?;
        std::io::Write::write_all(&mut tmp, &data).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        tmp.persist(&self.path)
            .map_err(|error| PersistenceError::Write {
                path: self.path.clone(),
                source: error.error,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_hydrate_round_trips() {
        let dir = tempdir().unwrap();
        let persistence = StatePersistence::at_path(dir.path().join(STATE_FILE_NAME));
        let mut snapshot = PersistedState::default();
        snapshot.pipeline_config.batch_size = 16;
        snapshot.current_step = PipelineStep::Generate;
        persistence.save(&snapshot).unwrap();
        let loaded = persistence.hydrate().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn missing_file_hydrates_to_none() {
        let dir = tempdir().unwrap();
        let persistence = StatePersistence::at_path(dir.path().join("absent.json"));
        assert!(persistence.hydrate().is_none());
    }

    #[test]
    fn corrupt_record_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        std::fs::write(&path, b"{not json").unwrap();
        let persistence = StatePersistence::at_path(path);
        assert!(persistence.hydrate().is_none());
    }

    #[test]
    fn save_overwrites_previous_record() {
        let dir = tempdir().unwrap();
        let persistence = StatePersistence::at_path(dir.path().join(STATE_FILE_NAME));
        persistence.save(&PersistedState::default()).unwrap();
        let mut second = PersistedState::default();
        second.gallery_filters.flagged_only = true;
        persistence.save(&second).unwrap();
        let loaded = persistence.hydrate().unwrap();
        assert!(loaded.gallery_filters.flagged_only);
    }
}
