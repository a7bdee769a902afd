//! Chunked download of one Gracenote lineup.

use std::collections::HashMap;
use std::env;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use rand::Rng;

use crate::domain::zap2it::{self, CHUNK_HOURS, ChannelListing};
use crate::domain::{AppError, Guide, Settings, lineup};
use crate::ports::{GridRequest, ListingsClient, ProgressSink};

/// Environment variable fixing the `userId` sent to the grid API.
pub const USER_ID_ENV: &str = "ZAP2XML_USER_ID";

/// What to fetch for a single lineup.
#[derive(Debug, Clone, PartialEq)]
pub struct LineupOptions {
    pub lineup_id: String,
    pub country: String,
    pub postal_code: String,
    pub timespan_hours: u32,
    pub delay: Duration,
    pub prefer_affiliate_names: bool,
}

impl LineupOptions {
    pub fn from_settings(lineup_id: &str, settings: &Settings) -> Self {
        Self {
            lineup_id: lineup_id.trim().to_string(),
            country: settings.country.clone(),
            postal_code: settings.postal_code.trim().to_string(),
            timespan_hours: settings.timespan_hours,
            delay: Duration::from_secs(settings.delay_seconds),
            prefer_affiliate_names: settings.prefer_affiliate_names,
        }
    }
}

fn user_id() -> String {
    match env::var(USER_ID_ENV) {
        Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => format!("{:08x}", rand::thread_rng().gen_range(0..=u32::MAX)),
    }
}

/// Download `options.timespan_hours` of listings starting at `start` and
/// build the lineup's guide.
///
/// Chunks rejected with an HTTP status are skipped; transport and decoding
/// failures abort the lineup.
pub fn fetch_lineup(
    client: &dyn ListingsClient,
    options: &LineupOptions,
    sink: &dyn ProgressSink,
    start: DateTime<Utc>,
) -> Result<Guide, AppError> {
    let lineup_id = options.lineup_id.trim();
    if lineup_id.is_empty() {
        return Err(AppError::MissingLineup);
    }
    if lineup::needs_postal(lineup_id) && options.postal_code.trim().is_empty() {
        return Err(AppError::PostalCodeRequired { kind: lineup::kind_label(lineup_id) });
    }

    let country = lineup::country3(&options.country);
    let (api_lineup, headend_id) = lineup::api_lineup(lineup_id, &country);
    let template = GridRequest {
        device: lineup::device(&api_lineup),
        streaming: lineup::is_streaming(&api_lineup),
        lineup_id: api_lineup,
        headend_id,
        country,
        postal_code: options.postal_code.trim().to_string(),
        time: 0,
        timespan_hours: CHUNK_HOURS,
        user_id: user_id(),
    };

    let offsets: Vec<u32> = (0..options.timespan_hours).step_by(CHUNK_HOURS as usize).collect();
    let mut listings: Vec<ChannelListing> = Vec::new();
    let mut index_by_id: HashMap<Option<String>, usize> = HashMap::new();

    for (idx, offset) in offsets.iter().enumerate() {
        sink.report(&format!("  GET chunk {}/{}", idx + 1, offsets.len()));
        let request =
            GridRequest { time: start.timestamp() + i64::from(*offset) * 3600, ..template.clone() };

        match client.fetch_grid(&request) {
            Ok(response) => {
                for channel in response.channels {
                    let slot = *index_by_id.entry(channel.channel_id.clone()).or_insert_with(|| {
                        listings.push(ChannelListing::from_grid(&channel));
                        listings.len() - 1
                    });
                    for mut event in channel.events {
                        zap2it::merge_filter_tags(&mut event);
                        listings[slot].events.push(event);
                    }
                }
            }
            Err(e) if e.is_http_status() => {
                sink.report(&format!("  Skipping chunk {}/{}: {}", idx + 1, offsets.len(), e));
            }
            Err(e) => return Err(e),
        }

        if !options.delay.is_zero() && idx + 1 < offsets.len() {
            debug!("Sleeping {:?} before next chunk", options.delay);
            thread::sleep(options.delay);
        }
    }

    if listings.is_empty() {
        return Err(AppError::NoChannels);
    }

    zap2it::sort_listings(&mut listings);
    Ok(zap2it::build_guide(&listings, options.prefer_affiliate_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::zap2it::GridResponse;
    use crate::testing::{FakeListingsClient, RecordingProgress};
    use chrono::TimeZone;
    use serial_test::serial;

    fn options(lineup_id: &str, hours: u32) -> LineupOptions {
        LineupOptions {
            lineup_id: lineup_id.into(),
            country: "us".into(),
            postal_code: String::new(),
            timespan_hours: hours,
            delay: Duration::ZERO,
            prefer_affiliate_names: false,
        }
    }

    fn grid(json: &str) -> GridResponse {
        serde_json::from_str(json).unwrap()
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn requires_lineup_and_postal_code() {
        let client = FakeListingsClient::default();
        let sink = RecordingProgress::default();

        assert!(matches!(
            fetch_lineup(&client, &options(" ", 6), &sink, start()),
            Err(AppError::MissingLineup)
        ));
        assert!(matches!(
            fetch_lineup(&client, &options("USA-OTA12345", 6), &sink, start()),
            Err(AppError::PostalCodeRequired { kind: "OTA/LocalBroadcast" })
        ));
        assert!(client.requests().is_empty());
    }

    #[test]
    #[serial]
    fn walks_chunks_and_merges_channels() {
        unsafe {
            env::set_var(USER_ID_ENV, "deadbeef");
        }
        let client = FakeListingsClient::default();
        client.push(Ok(grid(
            r#"{"channels": [{"channelId": "1", "callSign": "ZED", "events": [
                {"startTime": "2025-03-01T12:00:00Z", "endTime": "2025-03-01T13:00:00Z",
                 "program": {"title": "Morning"}, "filter": ["filter-news"]}]}]}"#,
        )));
        client.push(Ok(grid(
            r#"{"channels": [
                {"channelId": "1", "callSign": "ZED", "events": [
                    {"startTime": "2025-03-01T18:00:00Z", "endTime": "2025-03-01T19:00:00Z",
                     "program": {"title": "Evening"}}]},
                {"channelId": "2", "callSign": "abc", "events": []}]}"#,
        )));
        let sink = RecordingProgress::default();

        let guide = fetch_lineup(&client, &options("USA-DITV501-X", 12), &sink, start()).unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].time, start().timestamp());
        assert_eq!(requests[1].time, start().timestamp() + 6 * 3600);
        assert_eq!(requests[0].country, "USA");
        assert_eq!(requests[0].device, "X");
        assert_eq!(requests[0].user_id, "deadbeef");
        assert_eq!(sink.messages(), vec!["  GET chunk 1/2", "  GET chunk 2/2"]);

        let ids: Vec<_> = guide.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(guide.programmes.len(), 2);
        assert!(guide.programmes[0].categories.iter().any(|c| c == "News"));

        unsafe {
            env::remove_var(USER_ID_ENV);
        }
    }

    #[test]
    fn ota_lineups_use_default_lineup() {
        let client = FakeListingsClient::default();
        client.push(Ok(grid(r#"{"channels": [{"channelId": "9", "callSign": "KXYZ"}]}"#)));
        let sink = RecordingProgress::default();
        let mut opts = options("USA-OTA90210", 5);
        opts.postal_code = "90210".into();

        fetch_lineup(&client, &opts, &sink, start()).unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.lineup_id, "USA-lineupId-DEFAULT");
        assert_eq!(request.headend_id, "lineupId");
        assert_eq!(request.device, "-");
        assert_eq!(request.postal_code, "90210");
    }

    #[test]
    fn http_status_errors_skip_the_chunk() {
        let client = FakeListingsClient::default();
        client.push(Err(AppError::UpstreamServer(503)));
        client.push(Ok(grid(r#"{"channels": [{"channelId": "1", "callSign": "ONE"}]}"#)));
        let sink = RecordingProgress::default();

        let guide = fetch_lineup(&client, &options("USA-DITV501-X", 12), &sink, start()).unwrap();

        assert_eq!(guide.channels.len(), 1);
        assert!(sink.messages().iter().any(|m| m.starts_with("  Skipping chunk 1/2")));
    }

    #[test]
    fn network_errors_abort() {
        let client = FakeListingsClient::default();
        client.push(Err(AppError::Network("connection reset".into())));
        let sink = RecordingProgress::default();

        let err = fetch_lineup(&client, &options("USA-DITV501-X", 12), &sink, start()).unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn empty_response_is_no_channels() {
        let client = FakeListingsClient::default();
        let sink = RecordingProgress::default();

        assert!(matches!(
            fetch_lineup(&client, &options("USA-DITV501-X", 6), &sink, start()),
            Err(AppError::NoChannels)
        ));
    }
}
