use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

pub const WARC_VERSION: &str = "WARC/1.1";

/// Value of the `WARC-Type` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarcRecordType {
    Warcinfo,
    Request,
    Response,
    Resource,
    Metadata,
    Revisit,
    Conversion,
    Continuation,
    Other(String),
}

impl WarcRecordType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warcinfo => "warcinfo",
            Self::Request => "request",
            Self::Response => "response",
            Self::Resource => "resource",
            Self::Metadata => "metadata",
            Self::Revisit => "revisit",
            Self::Conversion => "conversion",
            Self::Continuation => "continuation",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for WarcRecordType {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "warcinfo" => Self::Warcinfo,
            "request" => Self::Request,
            "response" => Self::Response,
            "resource" => Self::Resource,
            "metadata" => Self::Metadata,
            "revisit" => Self::Revisit,
            "conversion" => Self::Conversion,
            "continuation" => Self::Continuation,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl fmt::Display for WarcRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// One WARC record: a named header block followed by an opaque content block.
///
/// `Content-Length` is derived from the block at construction time and kept
/// in sync; the block itself is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarcRecord {
    pub(crate) version: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) block:   Bytes,
}

impl WarcRecord {
    /// Create a record with a fresh `WARC-Record-ID`, the current `WARC-Date`
    /// and a SHA-256 `WARC-Block-Digest`.
    pub fn new(record_type: WarcRecordType, block: impl Into<Bytes>) -> Self {
        let block = block.into();
        let headers = vec![
            ("WARC-Type".to_string(), record_type.to_string()),
            (
                "WARC-Record-ID".to_string(),
                format!("<urn:uuid:{}>", uuid::Uuid::new_v4()),
            ),
            (
                "WARC-Date".to_string(),
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "WARC-Block-Digest".to_string(),
                format!("sha256:{}", hex::encode(Sha256::digest(&block))),
            ),
            ("Content-Length".to_string(), block.len().to_string()),
        ];
        Self {
            version: WARC_VERSION.to_string(),
            headers,
            block,
        }
    }

    /// A `warcinfo` record whose block is `key: value` fields.
    pub fn warcinfo(filename: &str, fields: &[(String, String)]) -> Self {
        let block: String = fields
            .iter()
            .map(|(key, value)| format!("{key}: {value}\r\n"))
            .collect();
        Self::new(WarcRecordType::Warcinfo, block)
            .with_header("WARC-Filename", filename)
            .with_header("Content-Type", "application/warc-fields")
    }

    /// A `request` record holding a serialized HTTP request.
    pub fn request(target_uri: &str, http_block: impl Into<Bytes>) -> Self {
        Self::new(WarcRecordType::Request, http_block)
            .with_header("WARC-Target-URI", target_uri)
            .with_header("Content-Type", "application/http; msgtype=request")
    }

    /// A `response` record holding a serialized HTTP response.
    pub fn response(target_uri: &str, http_block: impl Into<Bytes>) -> Self {
        Self::new(WarcRecordType::Response, http_block)
            .with_header("WARC-Target-URI", target_uri)
            .with_header("Content-Type", "application/http; msgtype=response")
    }

    /// Set a header, replacing an existing value with the same name.
    ///
    /// `Content-Length` cannot be overridden; it always describes the block.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        if name.eq_ignore_ascii_case("content-length") {
            return self;
        }
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.headers.push((name.to_string(), value)),
        }
        self
    }

    pub fn version(&self) -> &str { &self.version }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn record_type(&self) -> Option<WarcRecordType> { self.header("WARC-Type").map(WarcRecordType::from) }

    pub fn record_id(&self) -> Option<&str> { self.header("WARC-Record-ID") }

    pub fn target_uri(&self) -> Option<&str> { self.header("WARC-Target-URI") }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.header("WARC-Date")
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
    }

    pub fn block(&self) -> &Bytes { &self.block }

    pub fn content_length(&self) -> usize { self.block.len() }
}
