//! Error types for aql-cdx.

use thiserror::Error;

use crate::data::MatchScope;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pattern '{pattern}' implies {implied} scope but {explicit} was requested")]
    ScopeConflict {
        pattern:  String,
        explicit: MatchScope,
        implied:  MatchScope,
    },

    #[error("pattern '{pattern}' implies both domain and prefix scope")]
    AmbiguousPattern { pattern: String },

    #[error("invalid index endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("URL pattern is empty")]
    EmptyPattern,

    #[error("response is not JSON, first line: '{line}'")]
    NotJson { line: String },

    #[error("unrecognized response shape: {reason}")]
    UnrecognizedShape { reason: String },

    #[error("capture row is missing mandatory field '{field}': {row}")]
    MissingField { field: &'static str, row: String },

    #[error("capture row has invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error(transparent)]
    Fetch(#[from] aql_fetch::Error),
}

impl Error {
    /// Caller-side mistakes reported before any request is sent.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ScopeConflict { .. }
                | Self::AmbiguousPattern { .. }
                | Self::InvalidEndpoint { .. }
                | Self::EmptyPattern
        )
    }

    /// Upstream schema breaks: the index answered, but not in a shape we can read.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::NotJson { .. }
                | Self::UnrecognizedShape { .. }
                | Self::MissingField { .. }
                | Self::InvalidField { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
