//! Auto-refresh timing.

use chrono::{DateTime, Duration, Utc};

use super::Settings;

/// Whether an automatic refresh is due.
///
/// A missing or unparseable `last_refresh` counts as due.
pub fn should_refresh(settings: &Settings, now: DateTime<Utc>) -> bool {
    if !settings.auto_refresh_enabled {
        return false;
    }
    match settings.last_refresh_at() {
        Some(last) => now >= last + interval(settings),
        None => true,
    }
}

/// When the next automatic refresh is expected, `None` when disabled.
pub fn next_refresh(settings: &Settings, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if !settings.auto_refresh_enabled {
        return None;
    }
    Some(settings.last_refresh_at().map_or(now, |last| last + interval(settings)))
}

fn interval(settings: &Settings) -> Duration {
    Duration::hours(i64::from(settings.refresh_interval_hours))
}
