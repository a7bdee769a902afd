//! ESPN+ schedule scraping and virtual channel layout.

mod events;
mod html;
mod teams;

pub use events::{
    RawEvent, ScheduledEvent, build_guide, channel_id, dedupe, is_valid_event, parse_time_string,
    process_events,
};
pub use html::extract_events;
pub use teams::{extract_teams, team_logo_url};
