use aql_cdx::CaptureRecord;

pub const DEFAULT_BASE_URL: &str = "https://web.archive.org/web";

/// What to load: a bare URL, or a capture found through discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Url(String),
    Capture(Box<CaptureRecord>),
}

impl CaptureTarget {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Capture(capture) => &capture.url,
        }
    }
}

impl From<&str> for CaptureTarget {
    fn from(url: &str) -> Self { Self::Url(url.to_string()) }
}

impl From<String> for CaptureTarget {
    fn from(url: String) -> Self { Self::Url(url) }
}

impl From<CaptureRecord> for CaptureTarget {
    fn from(capture: CaptureRecord) -> Self { Self::Capture(Box::new(capture)) }
}

impl From<&CaptureRecord> for CaptureTarget {
    fn from(capture: &CaptureRecord) -> Self { Self::Capture(Box::new(capture.clone())) }
}

/// Capture loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MementoOptions {
    /// Archive prefix that `{timestamp}id_/{url}` is appended to.
    pub base_url: String,
}

impl Default for MementoOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl MementoOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}
