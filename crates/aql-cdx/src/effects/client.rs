use aql_fetch::{HttpClient, HttpRequest, Session};
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::debug;
use url::Url;

use crate::core::{CaptureQuery, ResolvedQuery, parse_page, parse_page_count, record_from_row};
use crate::data::{CaptureRecord, CdxOptions};
use crate::effects::cursor::CaptureCursor;
use crate::error::{Error, Result};

/// How one page request addresses its slice of the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Paging {
    Page(u64),
    Resume(Option<String>),
}

/// Records of one page and the key for the next request, if any.
#[derive(Debug, Clone)]
pub(crate) struct PageBatch {
    pub records:    Vec<CaptureRecord>,
    pub resume_key: Option<String>,
}

/// Client for a CDX-style index.
///
/// Every request goes through the shared [`Session`], so retries and the
/// per-host connection limit apply to discovery like to everything else.
pub struct CdxClient<C: HttpClient> {
    session:  Session<C>,
    endpoint: Url,
    options:  CdxOptions,
}

impl<C: HttpClient> Clone for CdxClient<C> {
    fn clone(&self) -> Self {
        Self {
            session:  self.session.clone(),
            endpoint: self.endpoint.clone(),
            options:  self.options.clone(),
        }
    }
}

impl<C: HttpClient> std::fmt::Debug for CdxClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdxClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("options", &self.options)
            .finish()
    }
}

impl<C: HttpClient + 'static> CdxClient<C> {
    /// # Errors
    ///
    /// [`Error::InvalidEndpoint`] when the configured endpoint is not a URL.
    pub fn new(session: Session<C>, options: CdxOptions) -> Result<Self> {
        let endpoint = Url::parse(&options.endpoint).map_err(|e| Error::InvalidEndpoint {
            endpoint: options.endpoint.clone(),
            reason:   e.to_string(),
        })?;
        Ok(Self {
            session,
            endpoint,
            options,
        })
    }

    pub fn session(&self) -> &Session<C> { &self.session }

    pub fn options(&self) -> &CdxOptions { &self.options }

    pub fn endpoint(&self) -> &Url { &self.endpoint }

    pub(crate) fn page_concurrency(&self) -> usize {
        self.options
            .page_concurrency
            .unwrap_or(self.session.options().max_connections_per_host)
            .max(1)
    }

    /// Open a cursor over every capture matching `query`.
    ///
    /// No request is sent until the first [`CaptureCursor::next_batch`].
    ///
    /// # Errors
    ///
    /// Scope errors from [`CaptureQuery::resolve`].
    pub fn cursor(&self, query: &CaptureQuery) -> Result<CaptureCursor<C>> {
        let resolved = query.resolve()?;
        Ok(CaptureCursor::new(self.clone(), resolved))
    }

    /// Stream every capture matching `query`, in index order.
    ///
    /// The stream ends after the first error. Dropping it cancels any
    /// request still in flight.
    ///
    /// # Errors
    ///
    /// Scope errors are reported here, before any request is sent.
    pub fn iter_captures(
        &self,
        query: &CaptureQuery,
    ) -> Result<impl Stream<Item = Result<CaptureRecord>> + Send + 'static> {
        let cursor = self.cursor(query)?;
        let batches = stream::try_unfold(cursor, |mut cursor| async move {
            Ok::<_, Error>(cursor.next_batch().await?.map(|batch| (batch, cursor)))
        });
        Ok(batches
            .map_ok(|batch| stream::iter(batch.into_iter().map(Ok)))
            .try_flatten()
            .boxed())
    }

    /// Ask the index how many pages `query` spans.
    ///
    /// `None` means counted pagination is unavailable: the probe body was not
    /// a page count, or the index rejected the probe with a 4xx status.
    pub async fn count_pages(&self, query: &ResolvedQuery) -> Result<Option<u64>> {
        let mut url = self.base_url(query);
        url.query_pairs_mut()
            .append_pair("showNumPages", "true")
            .append_pair("limit", "1");

        match self.session.send(HttpRequest::get(url)).await {
            Ok(response) => {
                let pages = parse_page_count(&response.text());
                if pages.is_none() {
                    debug!(url = %query.url, "page count probe unanswered");
                }
                Ok(pages)
            }
            Err(aql_fetch::Error::Permanent {
                status: Some(status),
                ..
            }) if (400..500).contains(&status) => {
                debug!(url = %query.url, status, "page count probe rejected");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn fetch_page(&self, query: &ResolvedQuery, paging: Paging) -> Result<PageBatch> {
        let mut url = self.base_url(query);
        match &paging {
            Paging::Page(page) => {
                url.query_pairs_mut().append_pair("page", &page.to_string());
            }
            Paging::Resume(key) => {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("showResumeKey", "true");
                if let Some(key) = key {
                    pairs.append_pair("resumeKey", key);
                }
            }
        }

        let response = self.session.send(HttpRequest::get(url)).await?;
        let page = parse_page(&response.text())?;
        let records = page
            .rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>>>()?;
        debug!(url = %query.url, ?paging, records = records.len(), "fetched page");

        Ok(PageBatch {
            records,
            resume_key: page.resume_key,
        })
    }

    fn base_url(&self, query: &ResolvedQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
            if let Some(size) = self.options.page_size {
                pairs.append_pair("pageSize", &size.to_string());
            }
        }
        url
    }
}
