use std::sync::Arc;

use crate::app::AppContext;
use crate::app::daemon::Daemon;
use crate::domain::{AppError, Settings};
use crate::ports::ProgressSink;

/// Overrides for `serve`. Applied on top of the stored settings, never saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Sets the interval and turns auto-refresh on.
    pub refresh_interval_hours: Option<u32>,
    pub no_refresh: bool,
    /// Turns auto-refresh on and refreshes right after start.
    pub refresh_now: bool,
}

impl ServeOptions {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server_host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server_port = port;
        }
        if let Some(hours) = self.refresh_interval_hours {
            settings.refresh_interval_hours = hours;
            settings.auto_refresh_enabled = true;
        }
        if self.no_refresh {
            settings.auto_refresh_enabled = false;
        }
        if self.refresh_now {
            settings.auto_refresh_enabled = true;
        }
    }
}

pub fn effective_settings(ctx: &AppContext, options: &ServeOptions) -> Result<Settings, AppError> {
    let mut settings = ctx.store().load_or_default();
    options.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Start the server and scheduler; the caller owns the returned daemon and
/// decides how long it lives.
pub fn start(
    ctx: &AppContext,
    settings: Settings,
    refresh_now: bool,
    sink: Arc<dyn ProgressSink>,
) -> Result<Daemon, AppError> {
    let daemon = Daemon::start(ctx, settings, sink)?;
    if refresh_now {
        daemon.refresh_now();
    }
    Ok(daemon)
}
