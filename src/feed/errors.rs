//! Feed error types
//!
//! All failures of the upstream funding feed are wrapped in FeedError.
//! None of them reach consumers of the published result: the scheduler
//! catches them and switches to fallback data.

use thiserror::Error;

/// Failure of a single feed fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Feed answered with a non-2xx HTTP status
    #[error("Bad status: HTTP {0}")]
    BadStatus(u16),

    /// Body is not the expected document (invalid JSON, missing mapping)
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl FeedError {
    /// Short machine-friendly label, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Network(_) => "network",
            FeedError::BadStatus(_) => "bad_status",
            FeedError::MalformedPayload(_) => "malformed_payload",
        }
    }
}

/// Result type alias for feed operations
pub type FeedResult<T> = std::result::Result<T, FeedError>;
