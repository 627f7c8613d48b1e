use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("path not found: '{0}'")]
    NotFound(PathBuf),

    #[error("already exists: '{0}'")]
    AlreadyExists(PathBuf),

    #[error("range {offset}+{length} lies outside '{path}' ({size} bytes)")]
    OutOfRange {
        path:   PathBuf,
        offset: u64,
        length: u64,
        size:   u64,
    },

    #[error("failed to commit '{from}' to '{to}': {source}")]
    Commit {
        from:   PathBuf,
        to:     PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the error means "nothing is there" rather than an I/O fault.
    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_) | Self::OutOfRange { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
