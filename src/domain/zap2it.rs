//! Gracenote grid API payloads and their mapping onto the guide model.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::guide::{Channel, EpisodeNum, Guide, Programme, Rating, xmltv_ns_from_date};

/// Hours covered by a single grid request.
pub const CHUNK_HOURS: u32 = 6;

const ASSET_BASE: &str = "https://zap2it.tmsimg.com/assets/";
const OVERVIEW_BASE: &str = "https://tvlistings.gracenote.com//overview.html";

static FILTER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^filter-").expect("static filter regex"));

/// Top-level grid response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridResponse {
    #[serde(default)]
    pub channels: Vec<GridChannel>,
}

/// One channel from the grid response.
///
/// The API is loose about types, so ids and numbers are accepted as either
/// strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridChannel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub station_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub call_sign: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub affiliate_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Channel normalised across chunks, accumulating events.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelListing {
    pub station_id: Option<String>,
    pub channel_id: Option<String>,
    pub call_sign: Option<String>,
    pub channel_no: Option<String>,
    pub affiliate_name: Option<String>,
    pub thumbnail: Option<String>,
    pub events: Vec<Value>,
}

impl ChannelListing {
    pub fn from_grid(channel: &GridChannel) -> Self {
        Self {
            station_id: channel.station_id.clone().or_else(|| channel.channel_id.clone()),
            channel_id: channel.channel_id.clone(),
            call_sign: channel.call_sign.clone().or_else(|| channel.name.clone()),
            channel_no: channel.channel_no.clone().or_else(|| channel.channel.clone()),
            affiliate_name: channel.affiliate_name.clone(),
            thumbnail: channel.thumbnail.clone(),
            events: Vec::new(),
        }
    }

    /// XMLTV channel id.
    pub fn xmltv_id(&self) -> String {
        self.station_id.clone().or_else(|| self.channel_id.clone()).unwrap_or_default()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_string(&v)))
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        _ => false,
    }
}

/// First non-empty string among `keys`.
fn field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map.get(*key).and_then(value_string))
}

/// First key holding something that parses as an integer.
fn int_field(map: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Either the string itself or the first element of a list.
fn first_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => items.first().and_then(value_string),
        other => value_string(other),
    }
}

/// Fold `filter-*` tags into the programme's lower-cased genre list.
pub fn merge_filter_tags(event: &mut Value) {
    let Some(event_map) = event.as_object_mut() else {
        return;
    };

    let mut genres = BTreeSet::new();
    if let Some(Value::Array(existing)) = event_map.get("program").and_then(|p| p.get("genres")) {
        for genre in existing {
            match genre {
                Value::String(s) => {
                    genres.insert(s.to_lowercase());
                }
                Value::Object(obj) => {
                    if let Some(name) = obj.get("name").and_then(value_string) {
                        genres.insert(name.to_lowercase());
                    }
                }
                _ => {}
            }
        }
    }
    if let Some(Value::Array(tags)) = event_map.get("filter") {
        for tag in tags {
            if let Some(tag) = value_string(tag) {
                genres.insert(FILTER_PREFIX_RE.replace(&tag, "").trim().to_lowercase());
            }
        }
    }
    if genres.is_empty() {
        return;
    }

    let program = event_map.entry("program").or_insert_with(|| Value::Object(Map::new()));
    if !program.is_object() {
        *program = Value::Object(Map::new());
    }
    if let Some(program) = program.as_object_mut() {
        program.insert(
            "genres".to_string(),
            Value::Array(genres.into_iter().map(Value::String).collect()),
        );
    }
}

/// Parse the timestamp shapes the grid API emits.
///
/// Accepts RFC 3339, `...Z` without offset, 10-digit epoch seconds, naive
/// date-times (treated as UTC) and bare dates (midnight UTC).
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if raw.len() == 10 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().ok().and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    }
    let naive = raw.trim_end_matches('Z');
    const FORMATS: [&str; 4] =
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_time_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value.and_then(value_string).and_then(|s| parse_time(&s))
}

/// Expand relative or protocol-less asset references to full URLs.
pub fn ensure_asset_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut url = raw.split('?').next().unwrap_or(raw).to_string();
    if url.starts_with("//") {
        url = format!("https:{}", url);
    }
    if !url.starts_with("http") {
        url = format!("{}{}", ASSET_BASE, url.trim_start_matches('/'));
    }
    let last_segment = url.rsplit('/').next().unwrap_or("");
    if !last_segment.contains('.') {
        url.push_str(".jpg");
    }
    url
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn genre_names(program: &Map<String, Value>) -> Vec<String> {
    match program.get("genres") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|g| match g {
                Value::Object(obj) => obj.get("name").and_then(value_string),
                other => value_string(other),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_movie_or_sports(program: &Map<String, Value>) -> bool {
    let genres: Vec<String> = genre_names(program).iter().map(|g| g.to_lowercase()).collect();
    let entity_type = field(program, &["entityType", "type"]).unwrap_or_default().to_lowercase();
    genres.iter().any(|g| g == "movie" || g == "sports")
        || entity_type == "movie"
        || entity_type == "sports"
}

fn icon_url(program: &Map<String, Value>, event: &Map<String, Value>) -> Option<String> {
    let preferred = program.get("preferredImage").and_then(|p| p.get("uri")).and_then(value_string);
    preferred
        .or_else(|| field(program, &["image"]))
        .or_else(|| field(event, &["thumbnail"]))
        .map(|icon| ensure_asset_url(&icon))
}

fn ends_with_four_digits(s: &str) -> bool {
    s.len() > 4 && s.as_bytes()[s.len() - 4..].iter().all(u8::is_ascii_digit)
}

/// The last (up to) four characters when they are all digits, so a bare
/// `1234` id qualifies too.
fn digit_tail(s: &str) -> Option<&str> {
    let tail = s.get(s.len().saturating_sub(4)..)?;
    (!tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit())).then_some(tail)
}

/// Build display names according to the naming preference.
fn display_names(listing: &ChannelListing, prefer_affiliate_names: bool) -> Vec<String> {
    let mut names = Vec::new();
    let call_sign = listing.call_sign.as_deref();
    let affiliate = listing.affiliate_name.as_deref();

    if prefer_affiliate_names {
        if let Some(affiliate) = affiliate {
            names.push(affiliate.to_string());
        }
        if let Some(call_sign) = call_sign {
            names.push(call_sign.to_string());
        }
        if let (Some(affiliate), Some(call_sign)) = (affiliate, call_sign) {
            names.push(format!("{} ({})", affiliate, call_sign));
        }
        if let Some(number) = &listing.channel_no {
            names.push(number.clone());
        }
    } else {
        if let Some(call_sign) = call_sign {
            names.push(call_sign.to_string());
        }
        if let Some(affiliate) = affiliate {
            names.push(affiliate.to_string());
        }
        if let (Some(call_sign), Some(affiliate)) = (call_sign, affiliate) {
            names.push(format!("{} {}", call_sign, affiliate));
        }
    }
    names
}

/// Sort listings by case-folded call sign, then channel number.
pub fn sort_listings(listings: &mut [ChannelListing]) {
    listings.sort_by_cached_key(|l| {
        (
            l.call_sign.clone().unwrap_or_default().to_lowercase(),
            l.channel_no.clone().unwrap_or_default(),
        )
    });
}

/// Convert accumulated listings into a guide.
pub fn build_guide(listings: &[ChannelListing], prefer_affiliate_names: bool) -> Guide {
    let channels = listings
        .iter()
        .map(|listing| Channel {
            id: listing.xmltv_id(),
            display_names: display_names(listing, prefer_affiliate_names),
            icon: listing.thumbnail.as_deref().map(ensure_asset_url),
        })
        .collect();

    let mut programmes = Vec::new();
    for listing in listings {
        let channel_id = listing.xmltv_id();
        let mut events: Vec<&Map<String, Value>> =
            listing.events.iter().filter_map(Value::as_object).collect();
        events.sort_by_cached_key(|ev| field(ev, &["startTime"]).unwrap_or_default());
        programmes.extend(events.into_iter().filter_map(|ev| build_programme(&channel_id, ev)));
    }

    Guide { generator: None, channels, programmes }
}

fn build_programme(channel_id: &str, event: &Map<String, Value>) -> Option<Programme> {
    let empty = Map::new();
    let program = event.get("program").and_then(Value::as_object).unwrap_or(&empty);

    let start = parse_time_value(event.get("startTime").or_else(|| event.get("start")))?;
    let stop = parse_time_value(event.get("endTime").or_else(|| event.get("end")))?;

    let mut programme = Programme::new(channel_id, start, stop);

    programme.title =
        first_string(program.get("title")).or_else(|| first_string(event.get("title")));
    programme.sub_title = field(program, &["episodeTitle"]);
    programme.desc = field(program, &["shortDesc", "longDescription", "shortDescription"])
        .or_else(|| field(event, &["description"]));
    programme.date = Some(
        field(program, &["releaseYear"]).unwrap_or_else(|| start.format("%Y%m%d").to_string()),
    );

    let mut genres = genre_names(program);
    genres.sort();
    programme.categories =
        genres.iter().filter(|g| !g.is_empty()).map(|g| capitalize(g)).collect();
    if programme.categories.is_empty() && !is_movie_or_sports(program) {
        programme.categories.push("Series".to_string());
    }

    programme.length_minutes = int_field(event, &["duration"])
        .or_else(|| int_field(program, &["duration"]))
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| *d > 0);
    programme.icon = icon_url(program, event);

    apply_identifiers(&mut programme, program, event, &start);
    apply_flags(&mut programme, program, event);

    programme.audio_stereo = true;
    programme.subtitles_teletext = true;
    programme.rating = rating(program, event);

    Some(programme)
}

fn apply_identifiers(
    programme: &mut Programme,
    program: &Map<String, Value>,
    event: &Map<String, Value>,
    start: &DateTime<Utc>,
) {
    let tms_id = field(program, &["tmsId"]).or_else(|| field(event, &["tmsId"]));
    let series_id = field(program, &["seriesId", "rootId"]).or_else(|| {
        tms_id
            .as_deref()
            .filter(|t| ends_with_four_digits(t))
            .map(|t| t[..t.len() - 4].to_string())
    });

    if let (Some(series), Some(tms)) = (&series_id, &tms_id) {
        programme.url =
            Some(format!("{}?programSeriesId={}&tmsId={}", OVERVIEW_BASE, series, tms));
    }

    match (&series_id, &tms_id, tms_id.as_deref().and_then(digit_tail)) {
        (Some(series), _, Some(tail)) => {
            programme
                .episode_nums
                .push(EpisodeNum::new("dd_progid", format!("{}.{}", series, tail)));
        }
        (_, Some(tms), _) => {
            let value = if tms.len() >= 6 && ends_with_four_digits(tms) {
                format!("{}.{}", &tms[..tms.len() - 4], &tms[tms.len() - 4..])
            } else {
                tms.clone()
            };
            programme.episode_nums.push(EpisodeNum::new("dd_progid", value));
        }
        _ => {}
    }

    let season = int_field(program, &["season", "seasonNumber", "seasonNum", "seasonNo"]);
    let episode =
        int_field(program, &["episode", "episodeNumber", "episodeNum", "epNum", "number"]);

    if season.is_some() || episode.is_some() {
        let season_ns = season.map(|s| s - 1).unwrap_or_else(|| i64::from(start.year()) - 1);
        let episode_ns = episode.map(|e| e - 1).unwrap_or(-1);
        let value = format!("{}.{}.", season_ns, episode_ns);
        programme.episode_nums.push(EpisodeNum::new("xmltv_ns", value));
        if let (Some(s), Some(e)) = (season, episode) {
            let label = format!("S{:02}E{:02}", s, e);
            programme.episode_nums.push(EpisodeNum::new("onscreen", label.clone()));
            programme.episode_nums.push(EpisodeNum::new("common", label));
        }
    } else {
        programme.episode_nums.push(EpisodeNum::new("xmltv_ns", xmltv_ns_from_date(start)));
    }
}

fn apply_flags(
    programme: &mut Programme,
    program: &Map<String, Value>,
    event: &Map<String, Value>,
) {
    let flags: BTreeSet<String> = match event.get("flag").or_else(|| event.get("flags")) {
        Some(Value::Array(items)) => {
            items.iter().filter_map(value_string).map(|f| f.trim().to_lowercase()).collect()
        }
        _ => BTreeSet::new(),
    };

    programme.live = flags.contains("live") || truthy(program.get("live"));
    programme.new = flags.contains("new")
        || flags.iter().any(|f| f.contains("premiere"))
        || truthy(program.get("new"));

    if !programme.live && !programme.new {
        let aired = field(program, &["originalAirDate", "airDate"])
            .and_then(|d| parse_time(&d))
            .map(|d| format!("{}000000", d.format("%Y%m%d")));
        programme.previously_shown = Some(aired);
    }
}

fn rating(program: &Map<String, Value>, event: &Map<String, Value>) -> Option<Rating> {
    let ratings = match program.get("ratings") {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => match event.get("ratings") {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => None,
        },
    };

    if let Some(items) = ratings {
        let first = items.first()?.as_object()?;
        let code = field(first, &["code", "rating"])?;
        let system = field(first, &["system"]).unwrap_or_else(|| "MPAA".to_string());
        return Some(Rating { system, value: code });
    }

    field(program, &["rating"]).map(|value| Rating { system: "MPAA".to_string(), value })
}
