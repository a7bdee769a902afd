//! Gracenote grid API client port.

use crate::domain::AppError;
use crate::domain::zap2it::GridResponse;

/// One grid API request covering a single chunk of the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRequest {
    pub lineup_id: String,
    pub headend_id: String,
    /// Three-letter country code.
    pub country: String,
    pub device: String,
    pub postal_code: String,
    /// Chunk start as a unix timestamp.
    pub time: i64,
    pub timespan_hours: u32,
    /// Streaming lineups omit `isOverride` and `pref`.
    pub streaming: bool,
    pub user_id: String,
}

impl GridRequest {
    /// Query parameters in the order the API expects. Empty values are dropped.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let postal = if self.postal_code.is_empty() { "-" } else { self.postal_code.as_str() };

        let mut pairs = vec![
            ("lineupId", self.lineup_id.clone()),
            ("timespan", self.timespan_hours.to_string()),
            ("headendId", self.headend_id.clone()),
            ("country", self.country.clone()),
            ("device", self.device.clone()),
        ];
        if !self.streaming {
            pairs.push(("isOverride", "true".to_string()));
        }
        pairs.push(("postalCode", postal.to_string()));
        pairs.push(("time", self.time.to_string()));
        if !self.streaming {
            pairs.push(("pref", "16,128".to_string()));
        }
        pairs.push(("userId", self.user_id.clone()));
        pairs.push(("aid", "chi".to_string()));
        pairs.push(("languagecode", "en-us".to_string()));

        pairs.retain(|(_, value)| !value.is_empty());
        pairs
    }
}

/// Port for fetching grid chunks.
pub trait ListingsClient: Send + Sync {
    /// Fetch one chunk. Retryable failures are retried inside the client;
    /// the error returned is the last one seen.
    fn fetch_grid(&self, request: &GridRequest) -> Result<GridResponse, AppError>;
}
