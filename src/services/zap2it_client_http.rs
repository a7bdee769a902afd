//! Gracenote grid API client using reqwest.

use std::sync::Once;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN, REFERER, USER_AGENT};
use url::Url;

use crate::domain::zap2it::GridResponse;
use crate::domain::{AppError, Settings};
use crate::ports::{GridRequest, ListingsClient};

pub(crate) const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:129.0) Gecko/20100101 Firefox/129.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edg/127.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15",
];

const MAX_BACKOFF_MS: u64 = 60_000;

/// HTTP client for the grid API.
///
/// Keeps a cookie jar across requests and primes it with a visit to the
/// site root before the first grid call.
pub struct HttpListingsClient {
    client: Client,
    grid_url: Url,
    site_root: Url,
    user_agent: Option<String>,
    max_retries: u32,
    retry_delay_ms: u64,
    warm_up: Once,
}

impl std::fmt::Debug for HttpListingsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListingsClient")
            .field("grid_url", &self.grid_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

impl HttpListingsClient {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let grid_url = Url::parse(&settings.zap2it_url)
            .map_err(|e| AppError::invalid_setting("zap2it_url", e.to_string()))?;
        let mut site_root = grid_url.clone();
        site_root.set_path("/");
        site_root.set_query(None);

        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let user_agent = Some(settings.user_agent.trim().to_string()).filter(|ua| !ua.is_empty());

        Ok(Self {
            client,
            grid_url,
            site_root,
            user_agent,
            max_retries: settings.max_retries,
            retry_delay_ms: settings.retry_delay_ms,
            warm_up: Once::new(),
        })
    }

    fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(ua) => ua.clone(),
            None => USER_AGENTS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(USER_AGENTS[0])
                .to_string(),
        }
    }

    fn warm_up(&self) {
        self.warm_up.call_once(|| {
            let result = self
                .client
                .get(self.site_root.clone())
                .header(USER_AGENT, self.user_agent())
                .send();
            if let Err(e) = result {
                debug!("Session warm-up failed: {}", e);
            }
        });
    }

    /// `retry_delay_ms * 2^(attempt-1)` capped at a minute, plus jitter of up
    /// to half the base delay.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        let base = self.retry_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS);
        let jitter = match self.retry_delay_ms / 2 {
            0 => 0,
            max => rand::thread_rng().gen_range(0..=max),
        };
        Duration::from_millis(base + jitter)
    }

    fn send(&self, request: &GridRequest) -> Result<GridResponse, AppError> {
        let response = self
            .client
            .get(self.grid_url.clone())
            .query(&request.query_pairs())
            .header(USER_AGENT, self.user_agent())
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(REFERER, self.site_root.as_str())
            .header(ORIGIN, self.site_root.origin().ascii_serialization())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            let body = response.text().map_err(|e| AppError::Network(e.to_string()))?;
            serde_json::from_str(&body)
                .map_err(|e| AppError::InvalidResponse(format!("invalid JSON: {}", e)))
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Err(AppError::RateLimited)
        } else if status.is_server_error() {
            Err(AppError::UpstreamServer(status.as_u16()))
        } else {
            let body = response.text().unwrap_or_default();
            Err(AppError::HttpStatus { status: status.as_u16(), body })
        }
    }
}

impl ListingsClient for HttpListingsClient {
    fn fetch_grid(&self, request: &GridRequest) -> Result<GridResponse, AppError> {
        self.warm_up();

        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            debug!(
                "GET grid {} t={} attempt {}/{}",
                request.lineup_id, request.time, attempt, attempts
            );
            match self.send(request) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.backoff(attempt);
                    warn!("Grid request failed ({}), retrying in {:?}", e, delay);
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn settings(server: &mockito::Server, max_retries: u32) -> Settings {
        Settings {
            zap2it_url: format!("{}/api/grid", server.url()),
            user_agent: "test-agent".into(),
            request_timeout_secs: 5,
            max_retries,
            retry_delay_ms: 1,
            ..Settings::default()
        }
    }

    fn request() -> GridRequest {
        GridRequest {
            lineup_id: "USA-DITV501-X".into(),
            headend_id: "DITV501".into(),
            country: "USA".into(),
            device: "X".into(),
            postal_code: String::new(),
            time: 1_700_000_000,
            timespan_hours: 6,
            streaming: false,
            user_id: "0badcafe".into(),
        }
    }

    #[test]
    fn fetch_grid_success_sends_query_and_headers() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/grid")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lineupId".into(), "USA-DITV501-X".into()),
                Matcher::UrlEncoded("postalCode".into(), "-".into()),
                Matcher::UrlEncoded("pref".into(), "16,128".into()),
                Matcher::UrlEncoded("time".into(), "1700000000".into()),
            ]))
            .match_header("user-agent", "test-agent")
            .match_header("cache-control", "no-cache")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"channels": [{"channelId": 101, "callSign": "WABC", "events": []}]}"#)
            .expect(1)
            .create();

        let client = HttpListingsClient::new(&settings(&server, 3)).unwrap();
        let response = client.fetch_grid(&request()).unwrap();

        assert_eq!(response.channels.len(), 1);
        assert_eq!(response.channels[0].channel_id.as_deref(), Some("101"));
        mock.assert();
    }

    #[test]
    fn retries_server_errors_then_gives_up() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/grid")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create();

        let client = HttpListingsClient::new(&settings(&server, 2)).unwrap();
        let err = client.fetch_grid(&request()).unwrap_err();

        assert!(matches!(err, AppError::UpstreamServer(503)));
        mock.assert();
    }

    #[test]
    fn retries_rate_limit() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/grid")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(2)
            .create();

        let client = HttpListingsClient::new(&settings(&server, 1)).unwrap();
        assert!(matches!(client.fetch_grid(&request()), Err(AppError::RateLimited)));
        mock.assert();
    }

    #[test]
    fn fails_fast_on_client_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/grid")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("bad lineup")
            .expect(1)
            .create();

        let client = HttpListingsClient::new(&settings(&server, 3)).unwrap();
        let err = client.fetch_grid(&request()).unwrap_err();

        assert!(
            matches!(err, AppError::HttpStatus { status: 400, ref body } if body == "bad lineup")
        );
        mock.assert();
    }

    #[test]
    fn invalid_json_is_not_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/grid")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>blocked</html>")
            .expect(1)
            .create();

        let client = HttpListingsClient::new(&settings(&server, 3)).unwrap();
        assert!(matches!(client.fetch_grid(&request()), Err(AppError::InvalidResponse(_))));
        mock.assert();
    }

    #[test]
    fn warm_up_visits_site_root_once() {
        let mut server = mockito::Server::new();
        let root = server.mock("GET", "/").with_status(200).expect(1).create();
        let _grid = server
            .mock("GET", "/api/grid")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"channels": []}"#)
            .create();

        let client = HttpListingsClient::new(&settings(&server, 0)).unwrap();
        client.fetch_grid(&request()).unwrap();
        client.fetch_grid(&request()).unwrap();
        root.assert();
    }

    #[test]
    fn rejects_unparseable_url() {
        let settings = Settings { zap2it_url: "not a url".into(), ..Settings::default() };
        assert!(matches!(
            HttpListingsClient::new(&settings),
            Err(AppError::InvalidSetting { ref key, .. }) if key == "zap2it_url"
        ));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let settings = Settings { retry_delay_ms: 40_000, ..Settings::default() };
        let client = HttpListingsClient::new(&settings).unwrap();

        let first = client.backoff(1);
        assert!(first >= Duration::from_millis(40_000) && first <= Duration::from_millis(60_000));
        let third = client.backoff(3);
        assert!(third >= Duration::from_millis(60_000) && third <= Duration::from_millis(80_000));
    }
}
