//! Application configuration stored as TOML under the `.medisynth` root.
//!
//! Settings cover the API endpoint, the audit attribution name, the stream
//! drain cadence and the substitute readings shown when the backend omits a
//! metric. Loading falls back to defaults when the file is missing; parse
//! failures surface as errors rather than silently resetting the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};
use thiserror::Error;

use crate::app_dirs;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings loaded from the TOML config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub audit: AuditSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub fallback_metrics: FallbackMetrics,
}

/// Endpoint configuration for the synthesis backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    /// Versioned REST base, e.g. `http://localhost:8000/api/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Attribution recorded on locally generated audit entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditSettings {
    #[serde(default = "default_audit_user")]
    pub user: String,
}

/// Cadence settings for the training-metrics subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamSettings {
    /// How often the caller drains pending stream events into the store.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Substitute readings used when the backend omits a metric.
///
/// The dashboard always renders a value for these gauges; which substitute is
/// shown is a config decision, not something buried at a call site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FallbackMetrics {
    #[serde(default = "default_privacy_score")]
    pub privacy_score: f64,
    #[serde(default = "default_gpu_memory_gb")]
    pub gpu_memory_gb: f64,
    #[serde(default = "default_gpu_load_pct")]
    pub gpu_load_pct: f64,
    #[serde(default = "default_cpu_load_pct")]
    pub cpu_load_pct: f64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            user: default_audit_user(),
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for FallbackMetrics {
    fn default() -> Self {
        Self {
            privacy_score: default_privacy_score(),
            gpu_memory_gb: default_gpu_memory_gb(),
            gpu_load_pct: default_gpu_load_pct(),
            cpu_load_pct: default_cpu_load_pct(),
        }
    }
}

/// Errors that may occur while loading or saving app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from disk, returning defaults if the file is missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let path = config_path()?;
    load_from_path(&path)
}

/// Load configuration from a specific path, returning defaults if missing.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist configuration to disk, overwriting any previous contents.
pub fn save(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_to_path(config, &path)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_audit_user() -> String {
    "Dr. Researcher".to_string()
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_privacy_score() -> f64 {
    0.97
}

fn default_gpu_memory_gb() -> f64 {
    8.4
}

fn default_gpu_load_pct() -> f64 {
    92.0
}

fn default_cpu_load_pct() -> f64 {
    45.0
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
