//! Error types for scorewire.
//!
//! Only setup paths (configuration, logging, opening storage) return these to callers.
//! The session and sync components log and absorb faults instead of propagating them.

use thiserror::Error;

/// Persistence slot errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Stored history has version {0}, newer than this build; left untouched")]
    NewerVersion(u32),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Collector transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid collector endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Transport not open")]
    NotOpen,

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Errors surfaced by setup and configuration APIs
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runtime stopped: {0}")]
    RuntimeStopped(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
