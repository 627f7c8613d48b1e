use aql_fetch::HttpClient;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesOrdered;
use tracing::{info, warn};

use crate::core::ResolvedQuery;
use crate::data::{CaptureRecord, DiscoveryProgress};
use crate::effects::client::{CdxClient, PageBatch, Paging};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pagination {
    Unprobed,
    Counted { next_page: u64, total: u64 },
    Resume { next_key: Option<String> },
    Done,
}

/// Pull-based pagination over one discovery query.
///
/// The first call probes for a page count. With one, up to the client's
/// page concurrency of pages are kept in flight and handed out in page
/// order. Without one, resume keys are followed one request at a time.
/// Dropping the cursor drops every in-flight request with it.
pub struct CaptureCursor<C: HttpClient> {
    client:     CdxClient<C>,
    query:      ResolvedQuery,
    state:      Pagination,
    in_flight:  FuturesOrdered<BoxFuture<'static, Result<PageBatch>>>,
    pages_done: u64,
}

impl<C: HttpClient + 'static> CaptureCursor<C> {
    pub(crate) fn new(client: CdxClient<C>, query: ResolvedQuery) -> Self {
        Self {
            client,
            query,
            state: Pagination::Unprobed,
            in_flight: FuturesOrdered::new(),
            pages_done: 0,
        }
    }

    pub fn query(&self) -> &ResolvedQuery { &self.query }

    pub fn pages_done(&self) -> u64 { self.pages_done }

    /// Known once a counted probe has succeeded.
    pub fn total_pages(&self) -> Option<u64> {
        match self.state {
            Pagination::Counted { total, .. } => Some(total),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool { self.state == Pagination::Done }

    /// Records of the next page, or `None` once the result set is exhausted.
    ///
    /// After an error the cursor is finished and returns `None`.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<CaptureRecord>>> {
        let result = self.advance().await;
        if result.is_err() {
            self.state = Pagination::Done;
            self.in_flight = FuturesOrdered::new();
        }
        result
    }

    /// The state only changes once an await has returned, so a caller that
    /// drops a pending `next_batch` can call it again without losing pages.
    async fn advance(&mut self) -> Result<Option<Vec<CaptureRecord>>> {
        loop {
            match self.state.clone() {
                Pagination::Unprobed => {
                    let pages = self.client.count_pages(&self.query).await?;
                    self.state = match pages {
                        Some(total) => {
                            info!(url = %self.query.url, scope = %self.query.scope, total, "paginating by page count");
                            Pagination::Counted { next_page: 0, total }
                        }
                        None => {
                            info!(url = %self.query.url, scope = %self.query.scope, "paginating by resume key");
                            Pagination::Resume { next_key: None }
                        }
                    };
                }
                Pagination::Counted { mut next_page, total } => {
                    let window = self.client.page_concurrency();
                    while self.in_flight.len() < window && next_page < total {
                        self.in_flight.push_back(self.page_future(Paging::Page(next_page)));
                        next_page += 1;
                    }
                    self.state = Pagination::Counted { next_page, total };

                    // In-flight pages survive a dropped call; `FuturesOrdered` keeps them.
                    let Some(batch) = self.in_flight.next().await else {
                        self.state = Pagination::Done;
                        continue;
                    };
                    let batch = batch?;
                    self.report(Some(total));
                    return Ok(Some(batch.records));
                }
                Pagination::Resume { next_key } => {
                    let batch = self
                        .client
                        .fetch_page(&self.query, Paging::Resume(next_key.clone()))
                        .await?;
                    self.report(None);
                    self.state = match batch.resume_key {
                        Some(key) if next_key.as_ref() == Some(&key) => {
                            warn!(url = %self.query.url, key = %key, "index repeated its resume key, stopping");
                            Pagination::Done
                        }
                        Some(key) => Pagination::Resume { next_key: Some(key) },
                        None => Pagination::Done,
                    };
                    return Ok(Some(batch.records));
                }
                Pagination::Done => return Ok(None),
            }
        }
    }

    fn page_future(&self, paging: Paging) -> BoxFuture<'static, Result<PageBatch>> {
        let client = self.client.clone();
        let query = self.query.clone();
        Box::pin(async move { client.fetch_page(&query, paging).await })
    }

    fn report(&mut self, total_pages: Option<u64>) {
        self.pages_done += 1;
        if let Some(on_progress) = &self.client.options().on_progress {
            on_progress(DiscoveryProgress {
                pages_done: self.pages_done,
                total_pages,
            });
        }
    }
}
