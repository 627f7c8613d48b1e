use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build capture URL for '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("capture of {url} unavailable")]
    CaptureUnavailable {
        url:    String,
        status: Option<u16>,
        #[source]
        source: aql_fetch::Error,
    },

    #[error(transparent)]
    Fetch(#[from] aql_fetch::Error),
}

impl Error {
    /// Status of the archive's last answer, when it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::CaptureUnavailable { status, .. } => *status,
            Self::Fetch(e) => e.status(),
            Self::InvalidTarget { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
