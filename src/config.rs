//! Configuration System
//!
//! Layered configuration for the session tracker, collector channel, history storage and
//! logging. Sources are merged in order: built-in defaults, the global user file, the
//! workspace files, then `SCOREWIRE__SECTION__KEY` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::model::{ClientInfo, DEFAULT_CLIENT_NAME};
use crate::session::{SessionSettings, DEFAULT_SAMPLE_PERIOD_MS, DEFAULT_SESSION_LENGTH_SECS};
use crate::sync::websocket::parse_endpoint;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

pub const DEFAULT_COLLECTOR_ENDPOINT: &str = "ws://localhost:8765";
pub const DEFAULT_HISTORY_SLOT: &str = "history";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScorewireConfig {
    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Collector connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// WebSocket endpoint of the local collector
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name announced in the `clientInfo` greeting
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

fn default_endpoint() -> String {
    DEFAULT_COLLECTOR_ENDPOINT.to_string()
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client_name: default_client_name(),
        }
    }
}

/// Session timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of one timed session in seconds
    #[serde(default = "default_length_secs")]
    pub length_secs: f64,

    /// Progress sampling period in milliseconds
    #[serde(default = "default_sample_period_ms")]
    pub sample_period_ms: u64,

    /// Clamp probe scores into `[0, total_cells]`
    #[serde(default)]
    pub clamp_score: bool,
}

fn default_length_secs() -> f64 {
    DEFAULT_SESSION_LENGTH_SECS
}

fn default_sample_period_ms() -> u64 {
    DEFAULT_SAMPLE_PERIOD_MS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            length_secs: default_length_secs(),
            sample_period_ms: default_sample_period_ms(),
            clamp_score: false,
        }
    }
}

/// History storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Key holding the serialized history
    #[serde(default = "default_slot")]
    pub slot: String,
}

/// `$XDG_DATA_HOME/scorewire/store` (or the platform equivalent).
pub fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "scorewire")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".scorewire/store"))
}

fn default_slot() -> String {
    DEFAULT_HISTORY_SLOT.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            slot: default_slot(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Collector(String),
    Session(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Collector(msg) => write!(f, "Collector: {}", msg),
            ValidationError::Session(msg) => write!(f, "Session: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ScorewireConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = parse_endpoint(&self.collector.endpoint) {
            errors.push(ValidationError::Collector(e.to_string()));
        }
        if self.collector.client_name.trim().is_empty() {
            errors.push(ValidationError::Collector(
                "client_name cannot be empty".to_string(),
            ));
        }

        if !(self.session.length_secs > 0.0) {
            errors.push(ValidationError::Session(format!(
                "length_secs must be positive, got {}",
                self.session.length_secs
            )));
        }
        if self.session.sample_period_ms == 0 {
            errors.push(ValidationError::Session(
                "sample_period_ms must be at least 1".to_string(),
            ));
        }

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("path cannot be empty".to_string()));
        }
        if self.storage.slot.is_empty() {
            errors.push(ValidationError::Storage("slot cannot be empty".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all errors into one `ApiError`.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            session_length_secs: self.session.length_secs,
            sample_period_ms: self.session.sample_period_ms,
            clamp_score: self.session.clamp_score,
        }
    }

    pub fn client_info(&self) -> ClientInfo {
        ClientInfo::new(self.collector.client_name.clone())
    }
}
