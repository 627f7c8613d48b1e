use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("record does not start with a WARC version line")]
    MissingVersion,

    #[error("malformed header line: '{0}'")]
    MalformedHeader(String),

    #[error("record has no valid Content-Length header")]
    MissingContentLength,

    #[error("record truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("not a gzip member")]
    NotGzip,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
