use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

/// HTTP protocol version observed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    Http09,
    Http10,
    #[default]
    Http11,
    Http2,
    Http3,
}

impl HttpVersion {
    /// Protocol token as used in `WARC-Protocol` headers (`http/1.1`, `h2`, ...).
    pub fn protocol_id(self) -> &'static str {
        match self {
            Self::Http09 => "http/0.9",
            Self::Http10 => "http/1.0",
            Self::Http11 => "http/1.1",
            Self::Http2 => "h2",
            Self::Http3 => "h3",
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http09 => write!(f, "HTTP/0.9"),
            Self::Http10 => write!(f, "HTTP/1.0"),
            Self::Http11 => write!(f, "HTTP/1.1"),
            Self::Http2 => write!(f, "HTTP/2"),
            Self::Http3 => write!(f, "HTTP/3"),
        }
    }
}

/// A read-only GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url:     Url,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
        }
    }

    /// Parse `url` and build a GET request for it.
    pub fn parse(url: &str) -> crate::Result<Self> {
        Url::parse(url).map(Self::get).map_err(|e| crate::Error::InvalidUrl {
            url:    url.to_string(),
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Whether a header with this name is already set (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Key used for per-host connection limiting: `host[:port]`.
    pub fn host_key(&self) -> String {
        match (self.url.host_str(), self.url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        }
    }
}

/// A fully buffered HTTP response, together with the request exactly as sent.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub request: HttpRequest,
    /// Final URL after redirects.
    pub url:     Url,
    pub status:  u16,
    pub version: HttpVersion,
    pub headers: Vec<(String, String)>,
    pub body:    Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Retry-After` in its delta-seconds form. HTTP-date values are ignored.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    pub fn text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: Vec<(String, String)>) -> HttpResponse {
        let request = HttpRequest::parse("https://web.archive.org/cdx/search/cdx").unwrap();
        HttpResponse {
            url: request.url.clone(),
            request,
            status: 503,
            version: HttpVersion::Http11,
            headers,
            body: Bytes::new(),
        }
    }

    #[test]
    fn host_key_includes_explicit_port() {
        let request = HttpRequest::parse("http://localhost:8080/cdx").unwrap();
        assert_eq!(request.host_key(), "localhost:8080");

        let request = HttpRequest::parse("https://web.archive.org/cdx").unwrap();
        assert_eq!(request.host_key(), "web.archive.org");
    }

    #[test]
    fn invalid_url_is_reported() {
        let err = HttpRequest::parse("not a url").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidUrl { .. }));
    }

    #[test]
    fn retry_after_seconds() {
        let resp = response(vec![("Retry-After".into(), "12".into())]);
        assert_eq!(resp.retry_after(), Some(Duration::from_secs(12)));

        let resp = response(vec![("Retry-After".into(), "Wed, 21 Oct 2015 07:28:00 GMT".into())]);
        assert_eq!(resp.retry_after(), None);
    }

    #[test]
    fn version_tokens() {
        assert_eq!(HttpVersion::Http11.to_string(), "HTTP/1.1");
        assert_eq!(HttpVersion::Http2.protocol_id(), "h2");
    }
}
