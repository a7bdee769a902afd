//! TOML-backed settings store.

use std::fs;

use crate::domain::{AppError, AppPaths, Settings};
use crate::ports::ConfigStore;
use crate::services::atomic_write;

/// Stores settings in `<config dir>/config.toml`.
#[derive(Debug, Clone)]
pub struct FilesystemConfigStore {
    paths: AppPaths,
}

impl FilesystemConfigStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    /// Store rooted at the platform (or overridden) directories.
    pub fn discover() -> Result<Self, AppError> {
        Ok(Self::new(AppPaths::discover()?))
    }
}

impl ConfigStore for FilesystemConfigStore {
    fn paths(&self) -> &AppPaths {
        &self.paths
    }

    fn load(&self) -> Result<Settings, AppError> {
        let path = self.paths.config_file();
        if !path.exists() {
            return Ok(Settings::with_paths(&self.paths));
        }

        let content = fs::read_to_string(&path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        settings.apply_path_defaults(&self.paths);
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), AppError> {
        settings.validate()?;

        fs::create_dir_all(self.paths.config_dir())?;
        let content = toml::to_string_pretty(settings)?;
        atomic_write(&self.paths.config_file(), content.as_bytes(), None)
    }
}
