//! API Facade for the application.
//!
//! Builds the production context from the user's config directory and hands
//! it to the command modules.

use std::sync::Arc;

use chrono::Utc;

use crate::app::commands::{config, download, install, serve, status};
use crate::app::daemon::Daemon;
use crate::app::AppContext;
use crate::ports::ProgressSink;
use crate::services::{FilesystemConfigStore, HttpClientFactory};

pub use crate::app::commands::config::{ConfigInfo, ConfigUpdate};
pub use crate::app::commands::download::DownloadOverrides;
pub use crate::app::commands::install::{
    DEFAULT_BIN_DIR, DEFAULT_PREFIX, InstallOptions, InstallOutcome,
};
pub use crate::app::commands::serve::ServeOptions;
pub use crate::app::commands::status::{NextRefresh, StatusReport, format_size};
pub use crate::app::manager::DownloadResult;
pub use crate::domain::{AppError, Settings};

/// Context backed by the config file on disk and real HTTP clients.
pub fn create_context() -> Result<AppContext, AppError> {
    let store = FilesystemConfigStore::discover()?;
    Ok(AppContext::new(Arc::new(store), Arc::new(HttpClientFactory)))
}

// =============================================================================
// Download Command API
// =============================================================================

/// Stored settings with one-shot overrides applied.
pub fn download_settings(overrides: &DownloadOverrides) -> Result<Settings, AppError> {
    download::effective_settings(&create_context()?, overrides)
}

/// Fetch every configured source and write the merged guide.
pub fn download(
    settings: Settings,
    sink: Arc<dyn ProgressSink>,
) -> Result<DownloadResult, AppError> {
    download::execute(&create_context()?, settings, sink)
}

// =============================================================================
// Config Command API
// =============================================================================

pub fn config_show() -> Result<ConfigInfo, AppError> {
    Ok(config::show(&create_context()?))
}

/// Apply and persist setting changes, returning a line per change.
pub fn config_set(update: &ConfigUpdate) -> Result<Vec<String>, AppError> {
    config::update(&create_context()?, update)
}

pub fn config_save(settings: &Settings) -> Result<(), AppError> {
    config::save(&create_context()?, settings)
}

// =============================================================================
// Status / Serve / Install
// =============================================================================

pub fn status() -> Result<StatusReport, AppError> {
    Ok(status::execute(&create_context()?, Utc::now()))
}

pub fn serve_settings(options: &ServeOptions) -> Result<Settings, AppError> {
    serve::effective_settings(&create_context()?, options)
}

/// Start the HTTP server and, when enabled, the refresh scheduler.
pub fn serve(
    settings: Settings,
    refresh_now: bool,
    sink: Arc<dyn ProgressSink>,
) -> Result<Daemon, AppError> {
    serve::start(&create_context()?, settings, refresh_now, sink)
}

/// Install the running executable and link it onto the PATH.
pub fn install(options: &InstallOptions) -> Result<InstallOutcome, AppError> {
    install::execute(options)
}
