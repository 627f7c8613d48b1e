use std::future::Future;

use crate::data::{HttpRequest, HttpResponse};

/// Transport-level failure of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect timed out")]
    ConnectTimeout,

    #[error("read timed out")]
    ReadTimeout,

    #[error("response body truncated: {0}")]
    TruncatedBody(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and truncated bodies are worth another attempt; anything else
    /// would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout | Self::ReadTimeout | Self::TruncatedBody(_)
        )
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations perform exactly one attempt: follow redirects, buffer the
/// body, and report the request as it went out in [`HttpResponse::request`].
/// Non-2xx statuses are returned as responses, not errors; retry policy lives
/// in [`Session`](crate::Session).
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Scripted mocks in tests
pub trait HttpClient: Send + Sync {
    fn execute(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::{HttpVersion, SessionOptions};

    /// Production HTTP client implementation using reqwest.
    ///
    /// Built without content decoding, so bodies are stored exactly as the
    /// archive served them.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(options: &SessionOptions) -> crate::Result<Self> {
            let client = reqwest::Client::builder()
                .connect_timeout(options.connect_timeout)
                .timeout(options.total_timeout)
                .pool_max_idle_per_host(options.max_connections_per_host)
                .build()
                .map_err(|e| crate::Error::Client(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an already configured reqwest client.
        pub fn with_client(client: reqwest::Client) -> Self { Self { client } }
    }

    impl From<reqwest::Version> for HttpVersion {
        fn from(version: reqwest::Version) -> Self {
            if version == reqwest::Version::HTTP_09 {
                Self::Http09
            } else if version == reqwest::Version::HTTP_10 {
                Self::Http10
            } else if version == reqwest::Version::HTTP_2 {
                Self::Http2
            } else if version == reqwest::Version::HTTP_3 {
                Self::Http3
            } else {
                Self::Http11
            }
        }
    }

    fn classify(e: &reqwest::Error) -> TransportError {
        if e.is_timeout() {
            if e.is_connect() {
                TransportError::ConnectTimeout
            } else {
                TransportError::ReadTimeout
            }
        } else if e.is_body() || e.is_decode() {
            TransportError::TruncatedBody(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }

    impl HttpClient for ReqwestClient {
        async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let mut builder = self.client.get(request.url.clone());
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }

            let response = builder.send().await.map_err(|e| classify(&e))?;
            let status = response.status().as_u16();
            let version = HttpVersion::from(response.version());
            let url = response.url().clone();
            let headers = response
                .headers()
                .iter()
                .map(|(k, v)| {
                    (
                        k.as_str().to_string(),
                        String::from_utf8_lossy(v.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response.bytes().await.map_err(|e| classify(&e))?;

            Ok(HttpResponse {
                request: request.clone(),
                url,
                status,
                version,
                headers,
                body,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_transport_errors() {
        assert!(TransportError::ConnectTimeout.is_retryable());
        assert!(TransportError::ReadTimeout.is_retryable());
        assert!(TransportError::TruncatedBody("eof".into()).is_retryable());
        assert!(!TransportError::Connect("refused".into()).is_retryable());
        assert!(!TransportError::Other("tls".into()).is_retryable());
    }
}
