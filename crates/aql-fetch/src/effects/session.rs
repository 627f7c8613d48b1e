use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::{honors_retry_after, is_retryable_status, jittered_delay};
use crate::data::{HttpRequest, HttpResponse, SessionOptions};
use crate::effects::http::HttpClient;
use crate::effects::limiter::HostLimiter;
use crate::error::{Error, Result};

/// HTTP session with transparent retries and a shared per-host limit.
///
/// Cloning is cheap; clones share the client, the options and the limiter,
/// so independent pipelines can each hold their own handle while the
/// aggregate load on one archive host stays under
/// [`SessionOptions::max_connections_per_host`].
pub struct Session<C: HttpClient> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    client:  C,
    options: SessionOptions,
    limiter: Arc<HostLimiter>,
}

impl<C: HttpClient> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: HttpClient> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.inner.options)
            .field("client", &"{ ... }")
            .finish()
    }
}

impl<C: HttpClient> Session<C> {
    pub fn new(client: C, options: SessionOptions) -> Self {
        let limiter = Arc::new(HostLimiter::new(options.max_connections_per_host));
        Self::with_limiter(client, options, limiter)
    }

    /// Build a session that shares an existing limiter, e.g. one session per
    /// task with a process-wide cap.
    pub fn with_limiter(client: C, options: SessionOptions, limiter: Arc<HostLimiter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                options,
                limiter,
            }),
        }
    }

    pub fn options(&self) -> &SessionOptions { &self.inner.options }

    pub fn limiter(&self) -> Arc<HostLimiter> { Arc::clone(&self.inner.limiter) }

    pub fn client(&self) -> &C { &self.inner.client }

    /// Apply the session-wide headers without overriding per-request ones.
    fn prepare(&self, mut request: HttpRequest) -> HttpRequest {
        let options = &self.inner.options;
        if !request.has_header("user-agent") {
            request.headers.push(("User-Agent".to_string(), options.user_agent.clone()));
        }
        for (key, value) in &options.headers {
            if !request.has_header(key) {
                request.headers.push((key.clone(), value.clone()));
            }
        }
        request
    }

    /// Send a GET request, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`Error::Transient`] once `max_retries` retries are used up
    /// - [`Error::Permanent`] immediately for non-retryable statuses or
    ///   transport failures
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = self.prepare(request);
        let options = &self.inner.options;
        let host = request.host_key();
        let url = request.url.to_string();
        let mut retry_count = 0u32;

        loop {
            let outcome = {
                let _permit = self.inner.limiter.acquire(&host).await;
                debug!(url = %url, attempt = retry_count + 1, "sending request");
                self.inner.client.execute(&request).await
            };

            let (reason, retry_after) = match outcome {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if is_retryable_status(response.status, &options.retryable_statuses) => {
                    let hint = response.retry_after().filter(|_| honors_retry_after(response.status));
                    (format!("status {}", response.status), hint)
                }
                Ok(response) => {
                    return Err(Error::Permanent {
                        url,
                        status: Some(response.status),
                        reason: format!("status {}", response.status),
                    });
                }
                Err(e) if e.is_retryable() => (e.to_string(), None),
                Err(e) => {
                    return Err(Error::Permanent {
                        url,
                        status: None,
                        reason: e.to_string(),
                    });
                }
            };

            if retry_count >= options.max_retries {
                return Err(Error::Transient {
                    url,
                    attempts: retry_count + 1,
                    reason,
                });
            }

            let delay = self.backoff(retry_count, retry_after);
            warn!(
                url = %url,
                attempt = retry_count + 1,
                reason = %reason,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            retry_count += 1;
        }
    }

    fn backoff(&self, retry_count: u32, retry_after: Option<Duration>) -> Duration {
        let options = &self.inner.options;
        let jittered = jittered_delay(
            retry_count,
            options.retry_backoff,
            options.max_backoff,
            &mut rand::thread_rng(),
        );
        match retry_after {
            Some(hint) => jittered.max(hint.min(options.max_backoff)),
            None => jittered,
        }
    }
}
