//! Configuration loading facade.

use std::path::{Path, PathBuf};

use config::{ConfigError, File};

use crate::config::merge::merge_policy::builder_with_defaults;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::ScorewireConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace files, env.
    pub fn load(workspace_root: &Path) -> Result<ScorewireConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load a single file on top of defaults, ignoring every other source.
    pub fn load_from_file(path: &Path) -> Result<ScorewireConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<ScorewireConfig, ConfigError> {
        builder_with_defaults()?.build()?.try_deserialize()
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
