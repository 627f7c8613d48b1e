//! Error types for aql-fetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Retry budget exhausted on a transient condition.
    #[error("giving up on {url} after {attempts} attempts: {reason}")]
    Transient {
        url:      String,
        attempts: u32,
        reason:   String,
    },

    /// Failure that retrying cannot fix (4xx, refused connection, ...).
    #[error("request to {url} failed: {reason}")]
    Permanent {
        url:    String,
        status: Option<u16>,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl Error {
    /// HTTP status of the last response, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Permanent { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool { matches!(self, Self::Transient { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
