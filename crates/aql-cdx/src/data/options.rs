use std::fmt;
use std::sync::Arc;

pub const DEFAULT_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// Snapshot passed to the progress callback after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryProgress {
    pub pages_done:  u64,
    /// Known only in counted pagination mode.
    pub total_pages: Option<u64>,
}

pub type ProgressFn = Arc<dyn Fn(DiscoveryProgress) + Send + Sync>;

/// Discovery client configuration.
#[derive(Clone)]
pub struct CdxOptions {
    /// Index URL; validated when the client is built.
    pub endpoint:         String,
    /// Pages requested at once in counted mode; `None` follows the
    /// session's per-host connection limit.
    pub page_concurrency: Option<usize>,
    /// Forwarded as `pageSize` when set.
    pub page_size:        Option<u32>,
    pub on_progress:      Option<ProgressFn>,
}

impl Default for CdxOptions {
    fn default() -> Self {
        Self {
            endpoint:         DEFAULT_ENDPOINT.to_string(),
            page_concurrency: None,
            page_size:        None,
            on_progress:      None,
        }
    }
}

impl fmt::Debug for CdxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdxOptions")
            .field("endpoint", &self.endpoint)
            .field("page_concurrency", &self.page_concurrency)
            .field("page_size", &self.page_size)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl CdxOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn page_concurrency(mut self, pages: usize) -> Self {
        self.page_concurrency = Some(pages.max(1));
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(DiscoveryProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}
