//! ESPN+ schedule page to virtual-channel guide.

use chrono::{DateTime, Utc};

use crate::domain::espn::{self, RawEvent};
use crate::domain::{AppError, Guide};
use crate::ports::{ProgressSink, SchedulePageClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EspnOptions {
    /// Channels to emit; 0 sizes to the events found plus the offset.
    pub num_channels: u32,
    pub channel_offset: u32,
}

/// Scrape the schedule page and build the ESPN+ guide.
pub fn fetch_espn_plus(
    client: &dyn SchedulePageClient,
    options: EspnOptions,
    sink: &dyn ProgressSink,
    now: DateTime<Utc>,
) -> Result<Guide, AppError> {
    sink.report("  Fetching ESPN+ schedule...");
    let html = client.fetch_schedule_page()?;
    sink.report(&format!("  Received {} bytes", html.len()));

    let events = espn::extract_events(&html);
    sink.report(&format!("  Parsed {} raw events", events.len()));

    let valid: Vec<RawEvent> = events.into_iter().filter(espn::is_valid_event).collect();
    sink.report(&format!("  {} valid events after filtering", valid.len()));
    if valid.is_empty() {
        return Err(AppError::NoEvents);
    }

    let scheduled = espn::process_events(&valid, options.channel_offset, now);
    let num_channels = match options.num_channels {
        0 => {
            let auto = scheduled.len() as u32 + options.channel_offset;
            sink.report(&format!("  Auto channels: {}", auto));
            auto
        }
        n => n,
    };

    sink.report(&format!(
        "  Generated {} events across {} channels",
        scheduled.len(),
        num_channels
    ));
    Ok(espn::build_guide(&scheduled, num_channels, now))
}
