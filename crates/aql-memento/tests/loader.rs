use std::sync::{Arc, Mutex};

use aql_cdx::{CaptureRecord, parse_timestamp};
use aql_fetch::{HttpClient, HttpRequest, HttpResponse, HttpVersion, Session, SessionOptions, TransportError};
use aql_memento::{CaptureLoader, Error, MementoOptions};
use aql_warc::WarcRecordType;
use bytes::Bytes;

/// Mock archive serving one fixed status and body, recording request URLs.
struct MockArchive {
    status: u16,
    body:   &'static [u8],
    seen:   Arc<Mutex<Vec<String>>>,
}

impl HttpClient for MockArchive {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.url.to_string());
        Ok(HttpResponse {
            request: request.clone(),
            url: request.url.clone(),
            status: self.status,
            version: HttpVersion::Http11,
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: Bytes::from_static(self.body),
        })
    }
}

fn loader(status: u16, body: &'static [u8]) -> (CaptureLoader<MockArchive>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let client = MockArchive {
        status,
        body,
        seen: Arc::clone(&seen),
    };
    let session = Session::new(client, SessionOptions::default().max_retries(0));
    (CaptureLoader::new(session, MementoOptions::default()), seen)
}

fn capture() -> CaptureRecord {
    CaptureRecord::new(
        "https://example.com/",
        "com,example)/",
        parse_timestamp("20190307123456").unwrap(),
        "ABCDEF",
    )
}

#[tokio::test]
async fn loads_raw_bytes_for_a_bare_url() {
    let (loader, seen) = loader(200, b"<html>original</html>");

    let body = loader.load("https://example.com/", None).await.unwrap();

    assert_eq!(body.as_ref(), b"<html>original</html>");
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["https://web.archive.org/web/*id_/https://example.com/"]
    );
}

#[tokio::test]
async fn capture_timestamp_wins_over_explicit_one() {
    let (loader, seen) = loader(200, b"ok");

    loader
        .load(capture(), parse_timestamp("2001"))
        .await
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["https://web.archive.org/web/20190307123456id_/https://example.com/"]
    );
}

#[tokio::test]
async fn missing_capture_is_reported() {
    let (loader, _seen) = loader(404, b"not found");

    let err = loader.load(&capture(), None).await.unwrap_err();

    assert!(matches!(err, Error::CaptureUnavailable { status: Some(404), .. }));
}

#[tokio::test]
async fn exhausted_retries_are_reported_as_unavailable() {
    let (loader, _seen) = loader(503, b"busy");

    let err = loader.load("https://example.com/", None).await.unwrap_err();

    assert!(matches!(err, Error::CaptureUnavailable { status: None, .. }));
}

#[tokio::test]
async fn exchange_becomes_linked_records() {
    let (loader, _seen) = loader(200, b"<html>original</html>");

    let records = loader.load_as_records(capture(), None).await.unwrap();

    let [request, response] = records.as_slice() else {
        panic!("expected two records, got {}", records.len());
    };
    assert_eq!(request.record_type(), Some(WarcRecordType::Request));
    assert_eq!(response.record_type(), Some(WarcRecordType::Response));
    assert_eq!(request.header("WARC-Concurrent-To"), response.record_id());
    assert_eq!(response.header("WARC-Concurrent-To"), request.record_id());
    assert_eq!(request.header("WARC-Protocol"), Some("http/1.1"));
    assert_eq!(
        response.target_uri(),
        Some("https://web.archive.org/web/20190307123456id_/https://example.com/")
    );

    let request_text = String::from_utf8_lossy(request.block());
    assert!(request_text.starts_with("GET /web/20190307123456id_/https://example.com/ HTTP/1.1\r\n"));
    assert!(request_text.contains("User-Agent: aql/"));

    let response_text = String::from_utf8_lossy(response.block());
    assert!(response_text.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n"));
    assert!(response_text.ends_with("<html>original</html>"));
}
