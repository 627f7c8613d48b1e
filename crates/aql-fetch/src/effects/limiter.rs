use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Per-host concurrency cap shared between sessions.
///
/// One semaphore per `host[:port]`, created lazily. Permits are held for the
/// duration of one attempt, not across backoff sleeps.
#[derive(Debug)]
pub struct HostLimiter {
    permits: usize,
    hosts:   Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl HostLimiter {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: permits.max(1),
            hosts:   Mutex::new(HashMap::new()),
        }
    }

    pub fn permits(&self) -> usize { self.permits }

    fn semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.permits))),
        )
    }

    /// Wait for a free slot on `host`.
    ///
    /// Returns `None` only if the semaphore was closed, which this type never does.
    pub async fn acquire(&self, host: &str) -> Option<OwnedSemaphorePermit> {
        self.semaphore(host).acquire_owned().await.ok()
    }

    /// Slots currently free on `host`.
    pub fn available(&self, host: &str) -> usize { self.semaphore(host).available_permits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hosts_are_limited_independently() {
        let limiter = HostLimiter::new(2);

        let _a = limiter.acquire("a.example").await;
        let _b = limiter.acquire("a.example").await;

        assert_eq!(limiter.available("a.example"), 0);
        assert_eq!(limiter.available("b.example"), 2);
    }

    #[tokio::test]
    async fn permits_return_on_drop() {
        let limiter = HostLimiter::new(1);
        {
            let _permit = limiter.acquire("web.archive.org").await;
            assert_eq!(limiter.available("web.archive.org"), 0);
        }
        assert_eq!(limiter.available("web.archive.org"), 1);
    }
}
