//! Workspace files: `config/config.toml`, then `config/{SCOREWIRE_ENV}.toml`.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use tracing::debug;

pub const ENV_VAR: &str = "SCOREWIRE_ENV";
const DEFAULT_ENV: &str = "development";

/// Deployment profile selecting the second workspace file.
pub fn active_env() -> String {
    std::env::var(ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

/// Workspace files that exist under `workspace_root`, lowest precedence first.
pub fn existing_files(workspace_root: &Path) -> Vec<PathBuf> {
    let dir = workspace_root.join("config");
    [
        dir.join("config.toml"),
        dir.join(format!("{}.toml", active_env())),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(existing_files(workspace_root)
        .into_iter()
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "workspace configuration applied");
            builder.add_source(File::from(path).required(false))
        }))
}
