//! Persistent user settings.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AppError, AppPaths};

pub const DEFAULT_ZAP2IT_URL: &str = "https://tvlistings.gracenote.com/api/grid";
pub const DEFAULT_ESPN_PLUS_URL: &str =
    "https://www.espn.com/watch/schedule/_/type/live/channel/ESPN_PLUS";
pub const DEFAULT_OUTPUT_FILENAME: &str = "zap2xml.xml";
pub const DEFAULT_SERVER_PORT: u16 = 9195;

/// Longest window the grid API is asked for, two weeks.
pub const MAX_TIMESPAN_HOURS: u32 = 336;

/// Settings loaded from `config.toml`.
///
/// Every field has a default so partial files load cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gracenote lineup identifiers, e.g. `USA-DITV501-X`.
    pub lineup_ids: Vec<String>,
    pub postal_code: String,
    pub country: String,

    /// Hours of listings to fetch, in 6-hour chunks.
    pub timespan_hours: u32,
    /// Pause between chunk requests.
    pub delay_seconds: u64,
    pub merge_lineups: bool,
    /// Show the network affiliate (e.g. "ABC") before the call sign.
    pub prefer_affiliate_names: bool,

    pub espn_plus_enabled: bool,
    /// Number of virtual ESPN+ channels; 0 sizes to the events found.
    pub espn_plus_channels: u32,
    pub espn_plus_offset: u32,

    pub output_dir: PathBuf,
    pub output_filename: String,

    pub auto_refresh_enabled: bool,
    pub refresh_interval_hours: u32,
    /// RFC 3339 timestamp of the last successful download.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<String>,

    /// Fixed User-Agent; empty rotates through browser agents.
    pub user_agent: String,

    pub server_enabled: bool,
    pub server_host: String,
    pub server_port: u16,

    pub zap2it_url: String,
    pub espn_plus_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lineup_ids: Vec::new(),
            postal_code: String::new(),
            country: "USA".to_string(),
            timespan_hours: 72,
            delay_seconds: 0,
            merge_lineups: true,
            prefer_affiliate_names: false,
            espn_plus_enabled: false,
            espn_plus_channels: 0,
            espn_plus_offset: 0,
            output_dir: PathBuf::new(),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            auto_refresh_enabled: false,
            refresh_interval_hours: 24,
            last_refresh: None,
            user_agent: String::new(),
            server_enabled: false,
            server_host: "0.0.0.0".to_string(),
            server_port: DEFAULT_SERVER_PORT,
            zap2it_url: DEFAULT_ZAP2IT_URL.to_string(),
            espn_plus_url: DEFAULT_ESPN_PLUS_URL.to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Settings {
    /// Defaults with directory-dependent fields resolved.
    pub fn with_paths(paths: &AppPaths) -> Self {
        let mut settings = Self::default();
        settings.apply_path_defaults(paths);
        settings
    }

    /// Fill in fields whose defaults depend on the data directory.
    pub fn apply_path_defaults(&mut self, paths: &AppPaths) {
        if self.output_dir.as_os_str().is_empty() {
            self.output_dir = paths.default_output_dir();
        }
        if self.output_filename.trim().is_empty() {
            self.output_filename = DEFAULT_OUTPUT_FILENAME.to_string();
        }
    }

    /// Full path of the generated XMLTV file.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_filename)
    }

    /// Lineup ids with whitespace trimmed and blanks removed.
    pub fn lineup_list(&self) -> Vec<String> {
        self.lineup_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    }

    /// Split a comma-separated lineup argument.
    pub fn parse_lineups(value: &str) -> Vec<String> {
        value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
    }

    /// Parsed `last_refresh`, `None` when absent or malformed.
    pub fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_refresh.as_deref()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
    }

    pub fn mark_refreshed(&mut self, at: DateTime<Utc>) {
        self.last_refresh = Some(at.to_rfc3339());
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.timespan_hours == 0 || self.timespan_hours > MAX_TIMESPAN_HOURS {
            return Err(AppError::invalid_setting(
                "timespan_hours",
                format!("must be between 1 and {}", MAX_TIMESPAN_HOURS),
            ));
        }
        if self.refresh_interval_hours == 0 {
            return Err(AppError::invalid_setting("refresh_interval_hours", "must be at least 1"));
        }
        if self.server_port == 0 {
            return Err(AppError::invalid_setting("server_port", "must be non-zero"));
        }
        let filename = self.output_filename.trim();
        if filename.is_empty() {
            return Err(AppError::invalid_setting("output_filename", "must not be empty"));
        }
        if filename.contains('/') || filename.contains('\\') {
            return Err(AppError::invalid_setting(
                "output_filename",
                "must be a file name, not a path",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.country, "USA");
        assert_eq!(settings.timespan_hours, 72);
        assert!(settings.merge_lineups);
        assert_eq!(settings.output_filename, "zap2xml.xml");
        assert_eq!(settings.server_port, 9195);
        assert_eq!(settings.refresh_interval_hours, 24);
        assert!(settings.last_refresh.is_none());
    }

    #[test]
    fn partial_toml_uses_defaults_and_ignores_unknown_keys() {
        let toml = r#"
lineup_ids = ["USA-OTA12345", " "]
postal_code = "10001"
legacy_option = true
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.lineup_list(), vec!["USA-OTA12345"]);
        assert_eq!(settings.postal_code, "10001");
        assert_eq!(settings.server_port, 9195);
    }

    #[test]
    fn serialized_settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.lineup_ids = vec!["USA-DITV501-X".into()];
        settings.output_dir = PathBuf::from("/tmp/epgs");
        let text = toml::to_string_pretty(&settings).unwrap();
        assert!(!text.contains("last_refresh"));
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn parse_lineups_trims_and_drops_blanks() {
        assert_eq!(Settings::parse_lineups("a, b,,c ,"), vec!["a", "b", "c"]);
        assert!(Settings::parse_lineups(" , ").is_empty());
    }

    #[test]
    fn path_defaults_fill_empty_output_dir() {
        let paths = AppPaths::new("/cfg", "/data");
        let settings = Settings::with_paths(&paths);
        assert_eq!(settings.output_path(), PathBuf::from("/data/epgs/zap2xml.xml"));

        let mut custom = Settings { output_dir: PathBuf::from("/srv/epg"), ..Settings::default() };
        custom.apply_path_defaults(&paths);
        assert_eq!(custom.output_dir, PathBuf::from("/srv/epg"));
    }

    #[test]
    fn malformed_last_refresh_is_treated_as_absent() {
        let settings = Settings { last_refresh: Some("yesterday".into()), ..Settings::default() };
        assert!(settings.last_refresh_at().is_none());

        let mut settings = Settings::default();
        let at = DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
        settings.mark_refreshed(at);
        assert_eq!(settings.last_refresh_at(), Some(at));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(Settings::default().validate().is_ok());

        let zero_span = Settings { timespan_hours: 0, ..Settings::default() };
        assert!(matches!(
            zero_span.validate(),
            Err(AppError::InvalidSetting { key, .. }) if key == "timespan_hours"
        ));

        let bad_name = Settings { output_filename: "../guide.xml".into(), ..Settings::default() };
        assert!(bad_name.validate().is_err());

        let no_interval = Settings { refresh_interval_hours: 0, ..Settings::default() };
        assert!(no_interval.validate().is_err());
    }
}
