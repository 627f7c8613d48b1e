use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a retrying [`Session`](crate::Session).
///
/// # Examples
///
/// ```
/// use aql_fetch::SessionOptions;
/// use std::time::Duration;
///
/// let options = SessionOptions::default()
///     .max_retries(5)
///     .retry_backoff(Duration::from_millis(200))
///     .header("From", "crawler@example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Maximum number of retries after the initial attempt.
    ///
    /// Total attempts = 1 (initial) + `max_retries`.
    ///
    /// Default: 10
    pub max_retries: u32,

    /// Base delay for full-jitter exponential backoff.
    ///
    /// Retry N sleeps a random duration in `[0, min(max_backoff, retry_backoff * 2^N)]`.
    ///
    /// Default: 1s
    #[serde(with = "duration_ms", rename = "retry_backoff_ms")]
    pub retry_backoff: Duration,

    /// Upper bound for a single backoff sleep.
    ///
    /// Default: 60s
    #[serde(with = "duration_ms", rename = "max_backoff_ms")]
    pub max_backoff: Duration,

    /// Time allowed to establish a connection.
    ///
    /// Default: 10s
    #[serde(with = "duration_ms", rename = "connect_timeout_ms")]
    pub connect_timeout: Duration,

    /// Time allowed for a whole request, body included. Independent of
    /// `connect_timeout`; archive responses can be slow to stream.
    ///
    /// Default: 300s
    #[serde(with = "duration_ms", rename = "total_timeout_ms")]
    pub total_timeout: Duration,

    /// Concurrent requests allowed against one host, shared by every clone
    /// of the session.
    ///
    /// Default: 10
    pub max_connections_per_host: usize,

    /// Response statuses that are retried.
    ///
    /// Default: 429, 502, 503, 504
    pub retryable_statuses: Vec<u16>,

    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Extra headers sent with every request, including retries.
    pub headers: Vec<(String, String)>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_retries:              10,
            retry_backoff:            Duration::from_secs(1),
            max_backoff:              Duration::from_secs(60),
            connect_timeout:          Duration::from_secs(10),
            total_timeout:            Duration::from_secs(300),
            max_connections_per_host: 10,
            retryable_statuses:       vec![429, 502, 503, 504],
            user_agent:               concat!("aql/", env!("CARGO_PKG_VERSION")).to_string(),
            headers:                  Vec::new(),
        }
    }
}

impl SessionOptions {
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    #[must_use]
    pub fn total_timeout(mut self, total_timeout: Duration) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    /// Set the per-host connection cap. Values below one are raised to one.
    #[must_use]
    pub fn max_connections_per_host(mut self, limit: usize) -> Self {
        self.max_connections_per_host = limit.max(1);
        self
    }

    #[must_use]
    pub fn retryable_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.retryable_statuses = statuses;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Serde helper storing a [`Duration`] as integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_archive_limits() {
        let options = SessionOptions::default();

        assert_eq!(options.max_retries, 10);
        assert_eq!(options.max_connections_per_host, 10);
        assert_eq!(options.retryable_statuses, vec![429, 502, 503, 504]);
        assert!(options.total_timeout > options.connect_timeout);
    }

    #[test]
    fn connection_limit_never_zero() {
        let options = SessionOptions::default().max_connections_per_host(0);
        assert_eq!(options.max_connections_per_host, 1);
    }

    #[test]
    fn deserializes_partial_config() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"max_retries": 3, "retry_backoff_ms": 250}"#).unwrap();

        assert_eq!(options.max_retries, 3);
        assert_eq!(options.retry_backoff, Duration::from_millis(250));
        assert_eq!(options.max_backoff, Duration::from_secs(60));
    }
}
