//! ESPN+ schedule page client using reqwest.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use url::Url;

use super::zap2it_client_http::USER_AGENTS;
use crate::domain::{AppError, Settings};
use crate::ports::SchedulePageClient;

#[derive(Debug)]
pub struct HttpSchedulePageClient {
    client: Client,
    url: Url,
    user_agent: String,
}

impl HttpSchedulePageClient {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let url = Url::parse(&settings.espn_plus_url)
            .map_err(|e| AppError::invalid_setting("espn_plus_url", e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let user_agent = match settings.user_agent.trim() {
            "" => USER_AGENTS[0].to_string(),
            ua => ua.to_string(),
        };

        Ok(Self { client, url, user_agent })
    }
}

impl SchedulePageClient for HttpSchedulePageClient {
    fn fetch_schedule_page(&self) -> Result<String, AppError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AppError::HttpStatus { status: status.as_u16(), body });
        }

        response.text().map_err(|e| AppError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(server: &mockito::Server) -> Settings {
        Settings {
            espn_plus_url: format!("{}/watch/schedule", server.url()),
            request_timeout_secs: 5,
            ..Settings::default()
        }
    }

    #[test]
    fn fetches_page_with_browser_headers() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/watch/schedule")
            .match_header("user-agent", USER_AGENTS[0])
            .match_header("accept-language", "en-US,en;q=0.9")
            .with_status(200)
            .with_body("<html><article>Game</article></html>")
            .create();

        let client = HttpSchedulePageClient::new(&settings(&server)).unwrap();
        let html = client.fetch_schedule_page().unwrap();

        assert!(html.contains("<article>"));
        mock.assert();
    }

    #[test]
    fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/watch/schedule").with_status(403).create();

        let client = HttpSchedulePageClient::new(&settings(&server)).unwrap();
        assert!(matches!(
            client.fetch_schedule_page(),
            Err(AppError::HttpStatus { status: 403, .. })
        ));
    }
}
