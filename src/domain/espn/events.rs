//! ESPN+ schedule events and their virtual-channel guide.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::America::New_York;
use regex::Regex;

use super::teams::{extract_teams, team_logo_url};
use crate::domain::guide::{Channel, EpisodeNum, GENERATOR_NAME, Guide, Programme};

const ESPN_PLUS_ICON: &str = "https://a.espncdn.com/combiner/i?img=/i/espnplus/espnplus-color.png";
const ARTWORK_BASE: &str = "https://s.secure.espncdn.com/stitcher/artwork/collections/airings";

/// Assumed event length when the page gives only a start time.
const EVENT_HOURS: i64 = 2;
/// Spacing for events whose start time is unknown.
const UNKNOWN_START_STEP_MINUTES: i64 = 30;
const IDLE_BLOCK_HOURS: i64 = 6;

const SKIP_TITLES: &[&str] = &[
    "watch",
    "schedule",
    "replays",
    "schedule & replays",
    "home",
    "espn+",
    "espn plus",
    "live",
    "upcoming",
    "featured",
    "browse",
    "sign in",
    "subscribe",
    "more",
    "see all",
    "view all",
];

const TITLE_KEYWORDS: &[&str] = &[
    "game",
    "match",
    "fight",
    "bout",
    "race",
    "championship",
    "tournament",
    "cup",
    "league",
    "series",
    "open",
    "classic",
];

const LEAGUE_KEYWORDS: &[&str] = &[
    "nba", "nfl", "nhl", "mlb", "mls", "ncaa", "ufc", "pga", "basketball", "football", "hockey",
    "soccer", "baseball", "tennis", "golf", "cricket", "rugby", "boxing", "mma",
];

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})\s*(am|pm)").expect("static clock regex")
});

static HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s*(am|pm)").expect("static hour regex"));

static STREAM_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/id/([a-f0-9\-]{36})").expect("static stream id regex"));

/// An event as scraped from the schedule page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawEvent {
    pub title: String,
    pub league: String,
    pub start_time: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
}

/// An event placed on a virtual channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub channel_id: String,
    pub channel_num: u32,
    pub title: String,
    pub league: String,
    pub start_label: Option<String>,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub image: Option<String>,
}

pub fn channel_id(num: u32) -> String {
    format!("ESPN+{:02}.rtv", num)
}

/// Keep real sporting events, drop navigation and generic labels.
pub fn is_valid_event(event: &RawEvent) -> bool {
    let title = event.title.trim().to_lowercase();
    let league = event.league.to_lowercase();

    if SKIP_TITLES.contains(&title.as_str())
        || title.chars().count() <= 3
        || title.starts_with("sign ")
    {
        return false;
    }

    title.contains(" vs ")
        || title.contains(" vs. ")
        || title.contains(" at ")
        || TITLE_KEYWORDS.iter().any(|kw| title.contains(kw))
        || LEAGUE_KEYWORDS.iter().any(|kw| league.contains(kw))
}

/// Drop exact duplicates while keeping first-seen order.
pub fn dedupe(events: Vec<RawEvent>) -> Vec<RawEvent> {
    let mut seen = HashSet::new();
    events.into_iter().filter(|event| seen.insert(event.clone())).collect()
}

/// Parse "8:00 pm" / "8pm" as Eastern wall-clock time on the reference's
/// UTC calendar date.
pub fn parse_time_string(raw: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let (hour, minute, meridiem) = if let Some(caps) = CLOCK_RE.captures(&text) {
        (caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?, caps[3].to_string())
    } else if let Some(caps) = HOUR_RE.captures(&text) {
        (caps[1].parse::<u32>().ok()?, 0, caps[2].to_string())
    } else {
        return None;
    };

    let hour = match (meridiem.as_str(), hour) {
        ("pm", h) if h != 12 => h + 12,
        ("am", 12) => 0,
        (_, h) => h,
    };

    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let local = reference.date_naive().and_time(time);
    New_York.from_local_datetime(&local).earliest().map(|dt| dt.with_timezone(&Utc))
}

fn artwork_for(url: &str) -> Option<String> {
    STREAM_ID_RE
        .captures(url)
        .map(|caps| format!("{}/{}/16x9.jpg", ARTWORK_BASE, &caps[1]))
}

fn logo_for(title: &str, league: &str) -> Option<String> {
    let (home, away) = extract_teams(title)?;
    team_logo_url(&home, league).or_else(|| team_logo_url(&away, league))
}

/// Assign channels and times to valid events.
///
/// Artwork comes from the stream id in the event URL, then a team logo,
/// then whatever image the page carried.
pub fn process_events(
    events: &[RawEvent],
    channel_offset: u32,
    now: DateTime<Utc>,
) -> Vec<ScheduledEvent> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let channel_num = index as u32 + channel_offset;
            let start = event
                .start_time
                .as_deref()
                .and_then(|label| parse_time_string(label, now))
                .unwrap_or_else(|| {
                    now + Duration::minutes(index as i64 * UNKNOWN_START_STEP_MINUTES)
                });

            let image = event
                .url
                .as_deref()
                .and_then(artwork_for)
                .or_else(|| logo_for(&event.title, &event.league))
                .or_else(|| event.image.clone());

            ScheduledEvent {
                channel_id: channel_id(channel_num),
                channel_num,
                title: event.title.clone(),
                league: event.league.clone(),
                start_label: event.start_time.clone(),
                start,
                stop: start + Duration::hours(EVENT_HOURS),
                image,
            }
        })
        .collect()
}

/// Build the ESPN+ guide: every virtual channel, an idle placeholder on
/// channels without events, and one live programme per event.
pub fn build_guide(events: &[ScheduledEvent], num_channels: u32, now: DateTime<Utc>) -> Guide {
    let channels = (0..num_channels)
        .map(|num| Channel {
            id: channel_id(num),
            display_names: vec![format!("ESPN+ {:02}", num), channel_id(num), "ESPN+".to_string()],
            icon: Some(ESPN_PLUS_ICON.to_string()),
        })
        .collect();

    let busy: HashSet<u32> = events.iter().map(|e| e.channel_num).collect();
    let block_start = now
        .with_minute(0)
        .and_then(|dt| dt.with_second(0))
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(now);
    let block_stop = block_start + Duration::hours(IDLE_BLOCK_HOURS);

    let mut programmes: Vec<Programme> = (0..num_channels)
        .filter(|num| !busy.contains(num))
        .map(|num| {
            let mut idle = Programme::new(channel_id(num), block_start, block_stop);
            idle.text_lang = Some("en".to_string());
            idle.title = Some("No Event Scheduled".to_string());
            idle.desc = Some("This ESPN+ channel is currently idle.".to_string());
            idle.categories = vec!["Sports".to_string()];
            idle
        })
        .collect();

    programmes.extend(events.iter().map(event_programme));

    Guide { generator: Some(GENERATOR_NAME.to_string()), channels, programmes }
}

/// `{year-1}.{month-1}{day-1:02}.`; the month index is not padded.
fn event_episode_num(start: &DateTime<Utc>) -> String {
    format!("{}.{}{:02}.", start.year() - 1, start.month0(), start.day0())
}

fn event_programme(event: &ScheduledEvent) -> Programme {
    let mut programme = Programme::new(event.channel_id.clone(), event.start, event.stop);
    programme.text_lang = Some("en".to_string());
    programme.title = Some(event.title.clone());

    let league = (!event.league.is_empty()).then(|| event.league.clone());
    programme.sub_title = league.clone();

    let mut desc = Vec::new();
    if let Some(league) = &league {
        desc.push(format!("Sport: {}", league));
    }
    if let Some(label) = event.start_label.as_deref().filter(|l| !l.is_empty()) {
        desc.push(format!("Scheduled: {}", label));
    }
    desc.push("Available on ESPN+".to_string());
    programme.desc = Some(desc.join(" | "));

    programme.categories.push("Sports".to_string());
    if let Some(league) = league.filter(|l| l.to_lowercase() != "sports") {
        programme.categories.push(league);
    }

    programme.icon = event.image.clone();
    programme.episode_nums.push(EpisodeNum::new("xmltv_ns", event_episode_num(&event.start)));
    programme.date = Some(event.start.format("%Y%m%d").to_string());
    programme.live = true;
    programme
}
