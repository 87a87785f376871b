use geosweep_core::GeometryError;
use thiserror::Error;

/// Failure of one call to the remote search primitive.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by search service (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("search request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("invalid search base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Configuration errors that reject a survey before any request is made.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("page limit must be at least 1, got {0}")]
    InvalidPageLimit(u32),

    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("survey has no tiles to visit")]
    EmptyTileSet,
}
