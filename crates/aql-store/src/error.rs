use aql_warc::WarcRecord;
use thiserror::Error;

use crate::data::RecordLocation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("record encodes to {size} bytes, more than the {max}-byte container limit")]
    RecordTooLarge { size: u64, max: u64 },

    #[error("no record at {key}:{offset}+{length}")]
    LocationNotFound { key: String, offset: u64, length: u64 },

    #[error("no unused container key after {attempts} attempts")]
    CollisionRetryExhausted { attempts: u32 },

    /// A container failed after earlier ones were finalized. `written`
    /// holds the records that are stored, with their locations.
    #[error("write stopped after {} stored records", .written.len())]
    Interrupted {
        written: Vec<(WarcRecord, RecordLocation)>,
        #[source]
        source:  Box<Error>,
    },

    #[error("object storage failed for '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error(transparent)]
    Fs(#[from] aql_fs::Error),

    #[error(transparent)]
    Warc(#[from] aql_warc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// A record that can never fit, whatever the rotation.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::RecordTooLarge { .. } => true,
            Self::Interrupted { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::LocationNotFound { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
