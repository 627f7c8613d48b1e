use aql_fetch::{HttpClient, HttpRequest, HttpResponse, Session};
use aql_warc::WarcRecord;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::{memento_url, request_block, response_block};
use crate::data::{CaptureTarget, MementoOptions};
use crate::error::{Error, Result};

/// Loads raw captures through a shared [`Session`].
pub struct CaptureLoader<C: HttpClient> {
    session: Session<C>,
    options: MementoOptions,
}

impl<C: HttpClient> Clone for CaptureLoader<C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            options: self.options.clone(),
        }
    }
}

impl<C: HttpClient> std::fmt::Debug for CaptureLoader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLoader")
            .field("options", &self.options)
            .finish()
    }
}

impl<C: HttpClient> CaptureLoader<C> {
    pub fn new(session: Session<C>, options: MementoOptions) -> Self { Self { session, options } }

    pub fn session(&self) -> &Session<C> { &self.session }

    pub fn options(&self) -> &MementoOptions { &self.options }

    /// Raw bytes of one capture.
    ///
    /// A [`CaptureTarget::Capture`] supplies its own URL and timestamp; an
    /// explicit `timestamp` next to it is ignored with a warning.
    ///
    /// # Errors
    ///
    /// - [`Error::CaptureUnavailable`] when the archive keeps answering with a
    ///   non-2xx status
    /// - [`Error::InvalidTarget`] when no valid capture URL can be built
    pub async fn load(&self, target: impl Into<CaptureTarget>, timestamp: Option<DateTime<Utc>>) -> Result<Bytes> {
        Ok(self.exchange(target.into(), timestamp).await?.body)
    }

    /// Load a capture and record the exchange as `[request, response]`.
    ///
    /// Both records carry the wire protocol in `WARC-Protocol` and point at
    /// each other through `WARC-Concurrent-To`.
    pub async fn load_as_records(
        &self,
        target: impl Into<CaptureTarget>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<WarcRecord>> {
        let response = self.exchange(target.into(), timestamp).await?;
        let target_uri = response.request.url.as_str();
        let protocol = response.version.protocol_id();

        let request = WarcRecord::request(target_uri, request_block(&response.request, response.version))
            .with_header("WARC-Protocol", protocol);
        let mut record = WarcRecord::response(target_uri, response_block(&response))
            .with_header("WARC-Protocol", protocol);
        if let Some(request_id) = request.record_id() {
            record = record.with_header("WARC-Concurrent-To", request_id);
        }
        let request = match record.record_id() {
            Some(response_id) => request.with_header("WARC-Concurrent-To", response_id),
            None => request,
        };
        Ok(vec![request, record])
    }

    async fn exchange(&self, target: CaptureTarget, timestamp: Option<DateTime<Utc>>) -> Result<HttpResponse> {
        let (url, timestamp) = match &target {
            CaptureTarget::Url(url) => (url.as_str(), timestamp),
            CaptureTarget::Capture(capture) => {
                if let Some(ignored) = timestamp {
                    warn!(
                        url = %capture.url,
                        ignored = %aql_cdx::format_timestamp(&ignored),
                        "timestamp given with a capture record, using the record's own"
                    );
                }
                (capture.url.as_str(), Some(capture.timestamp))
            }
        };

        let memento = memento_url(&self.options.base_url, url, timestamp.as_ref())?;
        debug!(url, memento = %memento, "loading capture");
        match self.session.send(HttpRequest::get(memento)).await {
            Ok(response) => Ok(response),
            Err(source @ (aql_fetch::Error::Permanent { status: Some(_), .. } | aql_fetch::Error::Transient { .. })) => {
                Err(Error::CaptureUnavailable {
                    url: url.to_string(),
                    status: source.status(),
                    source,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
