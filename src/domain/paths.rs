//! Filesystem locations used by zap2xml-manager.

use std::env;
use std::path::{Path, PathBuf};

use crate::domain::AppError;

/// Directory name under the platform config/data roots.
pub const APP_DIR: &str = "zap2xml-manager";

/// Settings file name inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "ZAP2XML_CONFIG_DIR";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ZAP2XML_DATA_DIR";

/// Resolved config and data directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self { config_dir: config_dir.into(), data_dir: data_dir.into() }
    }

    /// Resolve directories from the environment overrides, falling back to
    /// the platform config and local data directories.
    pub fn discover() -> Result<Self, AppError> {
        let config_dir = match env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| AppError::config_error("Could not determine config directory"))?
                .join(APP_DIR),
        };
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_local_dir()
                .ok_or_else(|| AppError::config_error("Could not determine data directory"))?
                .join(APP_DIR),
        };
        Ok(Self { config_dir, data_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Default directory for generated guides.
    pub fn default_output_dir(&self) -> PathBuf {
        self.data_dir.join("epgs")
    }
}
