use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::AppContext;
use crate::app::manager::{DownloadResult, EpgManager};
use crate::domain::{AppError, Settings};
use crate::ports::ProgressSink;

/// One-shot overrides for a download. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOverrides {
    /// Comma-separated lineup ids.
    pub lineups: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub timespan_hours: Option<u32>,
    /// Output file; its parent becomes the output directory.
    pub output: Option<PathBuf>,
    pub espn: bool,
    pub espn_channels: Option<u32>,
}

impl DownloadOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(lineups) = &self.lineups {
            settings.lineup_ids = Settings::parse_lineups(lineups);
        }
        if let Some(country) = &self.country {
            settings.country = country.clone();
        }
        if let Some(postal) = &self.postal_code {
            settings.postal_code = postal.clone();
        }
        if let Some(hours) = self.timespan_hours {
            settings.timespan_hours = hours;
        }
        if let Some(output) = &self.output {
            if let Some(name) = output.file_name() {
                settings.output_filename = name.to_string_lossy().into_owned();
            }
            settings.output_dir = match output.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => Path::new(".").to_path_buf(),
            };
        }
        if self.espn {
            settings.espn_plus_enabled = true;
        }
        if let Some(channels) = self.espn_channels {
            settings.espn_plus_channels = channels;
        }
    }
}

/// Stored settings with `overrides` applied and validated.
pub fn effective_settings(
    ctx: &AppContext,
    overrides: &DownloadOverrides,
) -> Result<Settings, AppError> {
    let mut settings = ctx.store().load_or_default();
    overrides.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

pub fn execute(
    ctx: &AppContext,
    mut settings: Settings,
    sink: Arc<dyn ProgressSink>,
) -> Result<DownloadResult, AppError> {
    EpgManager::new(ctx.clone(), sink).download(&mut settings)
}
