//! Settings persistence port.

use crate::domain::{AppError, AppPaths, Settings};

/// Port for loading and saving [`Settings`].
pub trait ConfigStore: Send + Sync {
    /// Directories this store resolves against.
    fn paths(&self) -> &AppPaths;

    /// Load settings. A missing file yields defaults; a malformed one is an error.
    fn load(&self) -> Result<Settings, AppError>;

    /// Validate and persist settings.
    fn save(&self, settings: &Settings) -> Result<(), AppError>;

    /// Load for read-only use, warning and falling back to defaults when the
    /// stored file cannot be read.
    fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("⚠️  Could not load config: {}", e);
                Settings::with_paths(self.paths())
            }
        }
    }
}
