//! Pure helpers: capture URLs and HTTP message serialization.

use aql_fetch::{HttpRequest, HttpResponse, HttpVersion};
use chrono::{DateTime, Utc};
use url::{Position, Url};

use crate::error::{Error, Result};

/// Raw-content URL of one capture.
///
/// Without a timestamp the `*` wildcard asks the archive for the closest
/// available capture.
pub fn memento_url(base_url: &str, url: &str, timestamp: Option<&DateTime<Utc>>) -> Result<Url> {
    let timestamp = timestamp.map_or_else(|| "*".to_string(), aql_cdx::format_timestamp);
    let raw = format!("{}/{timestamp}id_/{url}", base_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| Error::InvalidTarget {
        url:    url.to_string(),
        reason: e.to_string(),
    })
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        410 => "Gone",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

fn push_headers(block: &mut Vec<u8>, headers: &[(String, String)]) {
    for (name, value) in headers {
        block.extend_from_slice(name.as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(value.as_bytes());
        block.extend_from_slice(b"\r\n");
    }
    block.extend_from_slice(b"\r\n");
}

/// The request as it went out, in HTTP/1.x message form.
pub fn request_block(request: &HttpRequest, version: HttpVersion) -> Vec<u8> {
    let mut block = format!("GET {} {version}\r\n", &request.url[Position::BeforePath..]).into_bytes();
    let mut headers = request.headers.clone();
    if !request.has_header("host") {
        let host = request.url[Position::BeforeHost..Position::AfterPort].to_string();
        headers.insert(0, ("Host".to_string(), host));
    }
    push_headers(&mut block, &headers);
    block
}

/// The response as received, in HTTP/1.x message form.
///
/// The body was de-chunked by the client, so `Transfer-Encoding` is left out.
pub fn response_block(response: &HttpResponse) -> Vec<u8> {
    let mut block = format!(
        "{} {} {}\r\n",
        response.version,
        response.status,
        reason_phrase(response.status)
    )
    .into_bytes();
    let headers: Vec<_> = response
        .headers
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("transfer-encoding"))
        .cloned()
        .collect();
    push_headers(&mut block, &headers);
    block.extend_from_slice(&response.body);
    block
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn url_with_timestamp() {
        let ts = Utc.with_ymd_and_hms(2019, 3, 7, 12, 34, 56).unwrap();
        let url = memento_url("https://web.archive.org/web/", "https://example.com/a?b=1", Some(&ts)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://web.archive.org/web/20190307123456id_/https://example.com/a?b=1"
        );
    }

    #[test]
    fn url_without_timestamp_uses_wildcard() {
        let url = memento_url("https://web.archive.org/web", "example.com", None).unwrap();
        assert_eq!(url.as_str(), "https://web.archive.org/web/*id_/example.com");
    }

    #[test]
    fn invalid_base_is_reported() {
        assert!(matches!(
            memento_url("not a url", "example.com", None),
            Err(Error::InvalidTarget { .. })
        ));
    }

    #[test]
    fn request_block_adds_host() {
        let request = HttpRequest::parse("https://web.archive.org:8443/web/*id_/example.com?x=1")
            .unwrap()
            .header("User-Agent", "aql");
        let block = request_block(&request, HttpVersion::Http11);

        assert_eq!(
            String::from_utf8(block).unwrap(),
            "GET /web/*id_/example.com?x=1 HTTP/1.1\r\nHost: web.archive.org:8443\r\nUser-Agent: aql\r\n\r\n"
        );
    }

    #[test]
    fn response_block_drops_transfer_encoding() {
        let request = HttpRequest::parse("https://web.archive.org/web/*id_/example.com").unwrap();
        let response = HttpResponse {
            url: request.url.clone(),
            request,
            status: 200,
            version: HttpVersion::Http2,
            headers: vec![
                ("content-type".to_string(), "text/html".to_string()),
                ("transfer-encoding".to_string(), "chunked".to_string()),
            ],
            body: Bytes::from_static(b"<p>hi</p>"),
        };

        assert_eq!(
            String::from_utf8(response_block(&response)).unwrap(),
            "HTTP/2 200 OK\r\ncontent-type: text/html\r\n\r\n<p>hi</p>"
        );
    }
}
