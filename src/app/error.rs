use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeadlinerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HeadlinerError>;

/// Why a single feed contributed nothing to a poll cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("empty response body")]
    EmptyBody,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("document parse error: {0}")]
    Parse(String),

    #[error("unknown feed format for {0}")]
    UnknownFormat(String),
}

/// Why a single entry was skipped while its siblings were kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("malformed link {0:?}")]
    MalformedLink(String),
}
