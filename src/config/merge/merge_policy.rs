//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

use crate::config::{
    default_store_path, DEFAULT_COLLECTOR_ENDPOINT, DEFAULT_HISTORY_SLOT,
};
use crate::model::DEFAULT_CLIENT_NAME;
use crate::session::{DEFAULT_SAMPLE_PERIOD_MS, DEFAULT_SESSION_LENGTH_SECS};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("collector.endpoint", DEFAULT_COLLECTOR_ENDPOINT)?
        .set_default("collector.client_name", DEFAULT_CLIENT_NAME)?
        .set_default("session.length_secs", DEFAULT_SESSION_LENGTH_SECS)?
        .set_default("session.sample_period_ms", DEFAULT_SAMPLE_PERIOD_MS)?
        .set_default("session.clamp_score", false)?
        .set_default(
            "storage.path",
            default_store_path().to_string_lossy().to_string(),
        )?
        .set_default("storage.slot", DEFAULT_HISTORY_SLOT)
}
