use std::path::Path;
use std::sync::Mutex;

use crate::domain::{AppError, AppPaths, Settings};
use crate::ports::ConfigStore;

/// Config store kept in memory, rooted at a scratch directory.
pub struct MemoryConfigStore {
    paths: AppPaths,
    settings: Mutex<Settings>,
    pub saves: Mutex<usize>,
}

impl MemoryConfigStore {
    pub fn new(root: &Path) -> Self {
        let paths = AppPaths::new(root.join("config"), root.join("data"));
        let settings = Settings::with_paths(&paths);
        Self { paths, settings: Mutex::new(settings), saves: Mutex::new(0) }
    }

    pub fn with_settings(root: &Path, settings: Settings) -> Self {
        let store = Self::new(root);
        *store.settings.lock().unwrap() = settings;
        store
    }

    pub fn current(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn paths(&self) -> &AppPaths {
        &self.paths
    }

    fn load(&self) -> Result<Settings, AppError> {
        Ok(self.current())
    }

    fn save(&self, settings: &Settings) -> Result<(), AppError> {
        settings.validate()?;
        *self.settings.lock().unwrap() = settings.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
