use std::path::PathBuf;

use crate::app::AppContext;
use crate::domain::{AppError, Settings};

/// Settings changed by `config` setters. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub lineups: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub espn: Option<bool>,
    pub auto_refresh: Option<bool>,
    pub refresh_interval_hours: Option<u32>,
    pub server_port: Option<u16>,
    pub output_dir: Option<PathBuf>,
    pub friendly_names: Option<bool>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to `settings`, returning one line per changed field.
    pub fn apply(&self, settings: &mut Settings) -> Vec<String> {
        let mut changes = Vec::new();

        if let Some(lineups) = &self.lineups {
            settings.lineup_ids = Settings::parse_lineups(lineups);
            changes.push(format!("Set lineup_ids: {:?}", settings.lineup_ids));
        }
        if let Some(country) = &self.country {
            settings.country = country.clone();
            changes.push(format!("Set country: {}", settings.country));
        }
        if let Some(postal) = &self.postal_code {
            settings.postal_code = postal.clone();
            changes.push(format!("Set postal_code: {}", settings.postal_code));
        }
        if let Some(espn) = self.espn {
            settings.espn_plus_enabled = espn;
            changes.push(format!("Set espn_plus_enabled: {}", espn));
        }
        if let Some(auto_refresh) = self.auto_refresh {
            settings.auto_refresh_enabled = auto_refresh;
            changes.push(format!("Set auto_refresh_enabled: {}", auto_refresh));
        }
        if let Some(hours) = self.refresh_interval_hours {
            settings.refresh_interval_hours = hours;
            changes.push(format!("Set refresh_interval_hours: {}", hours));
        }
        if let Some(port) = self.server_port {
            settings.server_port = port;
            changes.push(format!("Set server_port: {}", port));
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
            changes.push(format!("Set output_dir: {}", dir.display()));
        }
        if let Some(friendly) = self.friendly_names {
            settings.prefer_affiliate_names = friendly;
            changes.push(format!("Set prefer_affiliate_names: {}", friendly));
        }

        changes
    }
}

/// Where configuration lives and what it currently says.
#[derive(Debug, Clone)]
pub struct ConfigInfo {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub settings: Settings,
}

pub fn show(ctx: &AppContext) -> ConfigInfo {
    let paths = ctx.paths();
    ConfigInfo {
        config_dir: paths.config_dir().to_path_buf(),
        data_dir: paths.data_dir().to_path_buf(),
        config_file: paths.config_file(),
        settings: ctx.store().load_or_default(),
    }
}

/// Apply `update` to the stored settings and save them.
///
/// A malformed config file is an error here rather than being silently
/// replaced by defaults.
pub fn update(ctx: &AppContext, update: &ConfigUpdate) -> Result<Vec<String>, AppError> {
    let mut settings = ctx.store().load()?;
    let changes = update.apply(&mut settings);
    ctx.store().save(&settings)?;
    Ok(changes)
}

/// Persist settings edited as a whole, as the interactive menu does.
pub fn save(ctx: &AppContext, settings: &Settings) -> Result<(), AppError> {
    ctx.store().save(settings)
}
