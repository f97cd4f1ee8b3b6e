//! Configuration loading: defaults, global file, workspace file, environment.

use super::ToolkitConfig;
use crate::error::ToolkitError;
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

/// Configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence: defaults (lowest), global config file, workspace
    /// `opkit.toml`, `OPKIT_*` environment with `__` as nested-key separator
    /// (highest).
    pub fn load(workspace_root: &Path) -> Result<ToolkitConfig, ToolkitError> {
        let mut builder = Config::builder();
        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                builder = builder.add_source(File::from(global).format(FileFormat::Toml));
            }
        }
        let workspace_file = workspace_root.join("opkit.toml");
        if workspace_file.exists() {
            builder = builder.add_source(File::from(workspace_file).format(FileFormat::Toml));
        }
        Self::finish(builder)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<ToolkitConfig, ToolkitError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ToolkitConfig, ToolkitError> {
        let merged = builder
            .add_source(
                Environment::with_prefix("OPKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ToolkitError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        let loaded: ToolkitConfig = merged
            .try_deserialize()
            .map_err(|e| ToolkitError::ConfigError(format!("Invalid configuration: {}", e)))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Global config file path (~/.config/opkit/config.toml on Linux).
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "opkit", "opkit")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
