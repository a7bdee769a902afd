//! In-memory XMLTV guide model.

mod xmltv;

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::domain::AppError;

pub use xmltv::render_xmltv;

/// Value written to `generator-info-name` on the `<tv>` root.
pub const GENERATOR_NAME: &str = "zap2xml-manager";

/// A complete XMLTV document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Guide {
    pub generator: Option<String>,
    pub channels: Vec<Channel>,
    pub programmes: Vec<Programme>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub id: String,
    pub display_names: Vec<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNum {
    pub system: String,
    pub value: String,
}

impl EpisodeNum {
    pub fn new(system: &str, value: impl Into<String>) -> Self {
        Self { system: system.to_string(), value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub system: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Programme {
    pub channel: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    /// `lang` attribute applied to title, sub-title and desc.
    pub text_lang: Option<String>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub desc: Option<String>,
    pub date: Option<String>,
    pub categories: Vec<String>,
    pub length_minutes: Option<u32>,
    pub icon: Option<String>,
    pub url: Option<String>,
    pub episode_nums: Vec<EpisodeNum>,
    pub live: bool,
    pub new: bool,
    /// `Some(None)` writes a bare `<previously-shown/>`.
    pub previously_shown: Option<Option<String>>,
    pub audio_stereo: bool,
    pub subtitles_teletext: bool,
    pub rating: Option<Rating>,
}

impl Programme {
    pub fn new(channel: impl Into<String>, start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self {
            channel: channel.into(),
            start,
            stop,
            text_lang: None,
            title: None,
            sub_title: None,
            desc: None,
            date: None,
            categories: Vec::new(),
            length_minutes: None,
            icon: None,
            url: None,
            episode_nums: Vec::new(),
            live: false,
            new: false,
            previously_shown: None,
            audio_stereo: false,
            subtitles_teletext: false,
            rating: None,
        }
    }
}

impl Channel {
    /// Case-folded key used to order channels in merged guides.
    fn sort_key(&self) -> String {
        self.display_names
            .iter()
            .find(|name| !name.is_empty())
            .unwrap_or(&self.id)
            .to_lowercase()
    }
}

/// XMLTV timestamp, e.g. `20250912183000 +0000`.
pub fn xmltv_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d%H%M%S %z").to_string()
}

/// Date-based `xmltv_ns` fallback: `{year-1}.{MM}{day-1:02}.`
///
/// 2025-09-12 encodes as `2024.0911.`
pub fn xmltv_ns_from_date(dt: &DateTime<Utc>) -> String {
    format!("{}.{:02}{:02}.", dt.year() - 1, dt.month(), dt.day() - 1)
}

/// Merge several guides into one.
///
/// The first occurrence of a channel id wins. Channels are ordered by their
/// first display name, case-insensitively; programmes follow grouped by
/// channel in that order and sorted by start. Programmes referencing a
/// channel absent from every guide are dropped.
pub fn merge(guides: Vec<Guide>) -> Result<Guide, AppError> {
    if guides.is_empty() {
        return Err(AppError::NoGuideData);
    }

    let mut channels: Vec<Channel> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut programmes_by_channel: HashMap<String, Vec<Programme>> = HashMap::new();
    let generator = guides.iter().find_map(|g| g.generator.clone());

    for guide in guides {
        for channel in guide.channels {
            if channel.id.is_empty() || index_by_id.contains_key(&channel.id) {
                continue;
            }
            index_by_id.insert(channel.id.clone(), channels.len());
            programmes_by_channel.entry(channel.id.clone()).or_default();
            channels.push(channel);
        }
        for programme in guide.programmes {
            if programme.channel.is_empty() {
                continue;
            }
            programmes_by_channel.entry(programme.channel.clone()).or_default().push(programme);
        }
    }

    channels.sort_by_cached_key(Channel::sort_key);

    let mut programmes = Vec::new();
    for channel in &channels {
        if let Some(mut list) = programmes_by_channel.remove(&channel.id) {
            list.sort_by_key(|p| p.start);
            programmes.extend(list);
        }
    }

    Ok(Guide { generator, channels, programmes })
}
