use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Library-wide error type for zap2xml-manager operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// A setting failed validation.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Config file could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Lineup identifier is missing or malformed.
    #[error("Lineup ID is required")]
    MissingLineup,

    /// Lineup kind requires a postal code.
    #[error("Postal code required for {kind} lineups")]
    PostalCodeRequired { kind: &'static str },

    /// Transport-level HTTP failure (connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream asked us to slow down.
    #[error("Rate limited (429)")]
    RateLimited,

    /// Upstream returned a 5xx status.
    #[error("Server error ({0})")]
    UpstreamServer(u16),

    /// Upstream returned a non-retryable status.
    #[error("HTTP error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    /// Upstream responded with something we cannot decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Grid API returned no channels for a lineup.
    #[error("No channels found in response")]
    NoChannels,

    /// ESPN+ schedule contained no usable events.
    #[error("No valid events found")]
    NoEvents,

    /// Nothing is configured to download.
    #[error("No lineup IDs configured and ESPN+ is disabled")]
    NothingToFetch,

    /// A configured lineup could not be fetched.
    #[error("Failed to fetch lineup {lineup}: {reason}")]
    LineupFailed { lineup: String, reason: String },

    /// No source produced any guide data.
    #[error("No EPG data was produced")]
    NoGuideData,

    /// XMLTV serialization failed.
    #[error("XMLTV write error: {0}")]
    Xml(String),

    /// HTTP server could not be started.
    #[error("Failed to start server on {addr}: {details}")]
    ServerStart { addr: String, details: String },

    /// Filesystem permission problem during install.
    #[error(
        "Permission denied writing {path}. Re-run with sudo or choose a --prefix/--bin-dir you can write."
    )]
    PermissionDenied { path: PathBuf },

    /// A regular file blocks the symlink location.
    #[error("{0} exists and is not a symlink (use --force to replace it)")]
    LinkConflict(PathBuf),

    /// Interactive prompt failed.
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn invalid_setting(key: &str, reason: impl Into<String>) -> Self {
        AppError::InvalidSetting { key: key.to_string(), reason: reason.into() }
    }

    /// Whether a request that produced this error may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::RateLimited | AppError::UpstreamServer(_))
    }

    /// Errors caused by an upstream HTTP status rather than transport or decoding.
    pub fn is_http_status(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited | AppError::UpstreamServer(_) | AppError::HttpStatus { .. }
        )
    }

    /// Provide an `io::ErrorKind`-like view for callers.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::Configuration(_)
            | AppError::InvalidSetting { .. }
            | AppError::ConfigParse(_)
            | AppError::ConfigSerialize(_)
            | AppError::Json(_)
            | AppError::MissingLineup
            | AppError::PostalCodeRequired { .. }
            | AppError::NothingToFetch
            | AppError::InvalidResponse(_)
            | AppError::Xml(_) => io::ErrorKind::InvalidInput,
            AppError::NoChannels | AppError::NoEvents | AppError::NoGuideData => {
                io::ErrorKind::NotFound
            }
            AppError::PermissionDenied { .. } => io::ErrorKind::PermissionDenied,
            AppError::LinkConflict(_) => io::ErrorKind::AlreadyExists,
            AppError::Network(_)
            | AppError::RateLimited
            | AppError::UpstreamServer(_)
            | AppError::HttpStatus { .. }
            | AppError::LineupFailed { .. }
            | AppError::ServerStart { .. }
            | AppError::Prompt(_) => io::ErrorKind::Other,
        }
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Prompt(err.to_string())
    }
}
