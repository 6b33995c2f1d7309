//! Structured logging through `tracing`.
//!
//! The library only emits events. An embedding host calls [`init_logging`] once to
//! install a subscriber built from [`LoggingConfig`], after applying the
//! `SCOREWIRE_LOG`, `SCOREWIRE_LOG_FORMAT` and `SCOREWIRE_LOG_OUTPUT` overrides.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::ApiError;

pub const LOG_ENV: &str = "SCOREWIRE_LOG";
pub const LOG_FORMAT_ENV: &str = "SCOREWIRE_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "SCOREWIRE_LOG_OUTPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Unknown log format '{}', expected text or json",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl FromStr for LogOutput {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(ApiError::ConfigError(format!(
                "Unknown log output '{}', expected stdout, stderr or file",
                other
            ))),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level or filter directive, e.g. `info` or `warn,scorewire=debug`.
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Destination when `output = "file"`.
    pub file: PathBuf,
    /// ANSI colors for text output on a terminal stream.
    pub color: bool,
    /// Per-target levels, e.g. `"scorewire::sync" = "debug"`.
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stderr,
            file: PathBuf::from(".scorewire/scorewire.log"),
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Apply the format and output environment overrides.
    pub fn with_env_overrides(mut self) -> Result<Self, ApiError> {
        if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
            self.format = format.parse()?;
        }
        if let Ok(output) = std::env::var(LOG_OUTPUT_ENV) {
            self.output = output.parse()?;
        }
        Ok(self)
    }

    /// Filter from `SCOREWIRE_LOG` when set, otherwise from `level` plus `modules`.
    pub fn env_filter(&self) -> Result<EnvFilter, ApiError> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
        self.configured_filter()
    }

    fn configured_filter(&self) -> Result<EnvFilter, ApiError> {
        let mut directives = vec![self.level.clone()];
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        directives.extend(
            modules
                .into_iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        EnvFilter::try_new(directives.join(","))
            .map_err(|e| ApiError::ConfigError(format!("Invalid log filter: {}", e)))
    }

    fn writer(&self) -> Result<BoxMakeWriter, ApiError> {
        Ok(match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => BoxMakeWriter::new(Mutex::new(open_append(&self.file)?)),
        })
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let config = config.cloned().unwrap_or_default().with_env_overrides()?;
    let filter = config.env_filter()?;
    let writer = config.writer()?;
    let ansi = config.color && config.output != LogOutput::File;

    let registry = Registry::default().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Logger already installed: {}", e)))
}

fn open_append(path: &Path) -> Result<File, ApiError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| {
            ApiError::ConfigError(format!("Cannot create log directory {}: {}", dir.display(), e))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Cannot open log file {}: {}", path.display(), e)))
}
