use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Topic pool error: {0}")]
    TopicPool(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Whether a backend call that failed with this error is worth repeating.
    ///
    /// Timeouts, throttling and gateway/service-unavailable responses are
    /// transient. Bad requests, rejected credentials and anything local
    /// (IO, decoding, configuration) are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Backend { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
