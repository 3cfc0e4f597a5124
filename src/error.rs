//! Crate-wide error types.

use thiserror::Error;

/// Top-level error type returned by fallible operations across the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database connection error: {0}")]
    DatabasePool(#[from] diesel::r2d2::PoolError),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("venue error [{venue}]: {kind}: {message}")]
    Venue {
        venue: String,
        kind: VenueErrorKind,
        message: String,
    },

    #[error("market not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Failure taxonomy for venue adapter calls, per the ingestion contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueErrorKind {
    /// Timeout, 5xx, connection reset. Retried with backoff by the adapter.
    Transient,
    /// 429 or venue-specific signal. Caller should widen pacing and retry next tick.
    RateLimited,
    /// Token invalid or expired.
    Auth,
    /// Unexpected payload shape. Dropped, not retried.
    Schema,
    /// Venue reports the market no longer exists.
    Closed,
}

impl std::fmt::Display for VenueErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transient => "TRANSIENT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Auth => "AUTH",
            Self::Schema => "SCHEMA",
            Self::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// Configuration loading/validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
