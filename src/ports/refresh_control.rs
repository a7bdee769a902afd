//! Port through which the HTTP server inspects and triggers refreshes.

use serde::Serialize;

/// Snapshot of the auto-refresh scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    pub running: bool,
    pub enabled: bool,
    pub interval_hours: u32,
    pub last_refresh: Option<String>,
    pub next_refresh: Option<String>,
}

pub trait RefreshControl: Send + Sync {
    fn status(&self) -> RefreshStatus;

    /// Start a refresh in the background and return immediately.
    fn refresh_now(&self);
}
