//! Response parsing for the shapes CDX-style indexes emit.
//!
//! Shapes are tried in order by detectors that return `None` when a body is
//! not theirs. Only when every detector declines is the body an error.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::data::{CaptureRecord, RobotFlag, parse_timestamp};
use crate::error::{Error, Result};

/// One capture row with lowercased field names.
pub type Row = Map<String, Value>;

/// Rows of one page plus the key for the next request, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows:       Vec<Row>,
    pub resume_key: Option<String>,
}

type Detector = fn(&str) -> Option<Page>;

const DETECTORS: &[(&str, Detector)] = &[
    ("tabular", tabular_document),
    ("object lines", object_lines),
    ("row lines", row_lines),
];

const PREVIEW_LEN: usize = 120;

/// Parse one page body into rows.
///
/// An empty body is an empty page.
///
/// # Errors
///
/// - [`Error::NotJson`] when the first line is not JSON
/// - [`Error::UnrecognizedShape`] when it is JSON but no known shape
pub fn parse_page(body: &str) -> Result<Page> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Page::default());
    }

    for (shape, detect) in DETECTORS {
        if let Some(page) = detect(body) {
            trace!(shape, rows = page.rows.len(), resume = page.resume_key.is_some(), "parsed page");
            return Ok(page);
        }
    }

    let first = body.lines().next().unwrap_or_default().trim();
    if serde_json::from_str::<Value>(first).is_err() && !first.starts_with('[') {
        return Err(Error::NotJson {
            line: preview(first),
        });
    }
    Err(Error::UnrecognizedShape {
        reason: format!("neither a table, object lines nor row lines: {}", preview(first)),
    })
}

/// Parse a page-count probe: a bare integer or an object with `pages`.
///
/// `None` means the index does not support counted pagination.
pub fn parse_page_count(body: &str) -> Option<u64> {
    let body = body.trim();
    if let Ok(pages) = body.parse::<u64>() {
        return Some(pages);
    }
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => map.get("pages").and_then(Value::as_u64),
        _ => None,
    }
}

/// `[[header...], [values...], ..., [], [resume_key]]`
fn tabular_document(body: &str) -> Option<Page> {
    let Value::Array(rows) = serde_json::from_str::<Value>(body).ok()? else {
        return None;
    };
    let mut rows = rows
        .into_iter()
        .map(|row| match row {
            Value::Array(values) => Some(values),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let mut resume_key = None;
    if rows.len() >= 2 && rows[rows.len() - 1].len() == 1 && rows[rows.len() - 2].is_empty() {
        resume_key = rows.pop().and_then(|mut key| key.pop()).and_then(key_from_value);
        rows.pop();
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }

    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Some(Page {
            rows: Vec::new(),
            resume_key,
        });
    };
    let header = header_names(header)?;
    let rows = rows
        .map(|values| zip_row(&header, values))
        .collect::<Option<Vec<_>>>()?;
    Some(Page { rows, resume_key })
}

/// One JSON object per line, optionally a blank line and a resume key.
fn object_lines(body: &str) -> Option<Page> {
    let (records, resume_key) = split_trailer(body)?;
    let rows = records
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match serde_json::from_str::<Value>(line).ok()? {
            Value::Object(map) => Some(lowercase_keys(map)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Page { rows, resume_key })
}

/// One JSON array per line, the first naming the fields.
fn row_lines(body: &str) -> Option<Page> {
    let (records, resume_key) = split_trailer(body)?;
    let mut lines = records
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match serde_json::from_str::<Value>(line).ok()? {
            Value::Array(values) => Some(values),
            _ => None,
        });
    let header = header_names(lines.next()??)?;
    let rows = lines
        .map(|values| zip_row(&header, values?))
        .collect::<Option<Vec<_>>>()?;
    Some(Page { rows, resume_key })
}

/// Split line-oriented bodies at the first blank line.
///
/// What follows must be a single line holding the resume key.
fn split_trailer(body: &str) -> Option<(&str, Option<String>)> {
    let blank = body.find("\n\n").or_else(|| body.find("\r\n\r\n"));
    let Some(at) = blank else {
        return Some((body, None));
    };
    let (records, trailer) = body.split_at(at);
    let trailer = trailer.trim();
    if trailer.lines().count() > 1 {
        return None;
    }
    let key = match serde_json::from_str::<Value>(trailer) {
        Ok(value) => key_from_value(value)?,
        Err(_) if !trailer.contains(char::is_whitespace) => trailer.to_string(),
        Err(_) => return None,
    };
    Some((records, Some(key)))
}

fn key_from_value(value: Value) -> Option<String> {
    let key = match value {
        Value::String(key) => Some(key),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(mut values) if values.len() == 1 => values.pop().and_then(key_from_value),
        Value::Object(map) => ["resumeKey", "resumekey", "resume_key"]
            .iter()
            .find_map(|name| map.get(*name))
            .and_then(|v| v.as_str().map(str::to_string)),
        _ => None,
    };
    key.filter(|key| !key.is_empty())
}

fn header_names(header: Vec<Value>) -> Option<Vec<String>> {
    header
        .into_iter()
        .map(|name| name.as_str().map(str::to_ascii_lowercase))
        .collect()
}

fn zip_row(header: &[String], values: Vec<Value>) -> Option<Row> {
    if values.len() != header.len() {
        return None;
    }
    Some(header.iter().cloned().zip(values).collect())
}

fn lowercase_keys(map: Map<String, Value>) -> Row {
    map.into_iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect()
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_LEN) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Field value by any of its aliases, with `-` and empty strings read as absent.
fn field(row: &Row, aliases: &[&str]) -> Option<String> {
    let value = aliases.iter().find_map(|alias| row.get(*alias))?;
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty() && text != "-").then_some(text)
}

fn required(row: &Row, name: &'static str, aliases: &[&str]) -> Result<String> {
    field(row, aliases).ok_or_else(|| Error::MissingField {
        field: name,
        row:   preview(&Value::Object(row.clone()).to_string()),
    })
}

fn numeric<T: std::str::FromStr>(row: &Row, name: &'static str, aliases: &[&str]) -> Result<Option<T>> {
    field(row, aliases)
        .map(|text| {
            text.parse::<T>().map_err(|_| Error::InvalidField {
                field: name,
                value: text,
            })
        })
        .transpose()
}

/// Parse a whitespace-separated flag string.
///
/// Flags may also be run together (`"FI"`). Unknown letters are logged and
/// skipped without losing the known ones next to them.
fn parse_flags(text: &str) -> BTreeSet<RobotFlag> {
    let mut flags = BTreeSet::new();
    for token in text.split_whitespace() {
        for letter in token.chars() {
            match RobotFlag::from_token(letter) {
                Some(flag) => {
                    flags.insert(flag);
                }
                None => warn!(token, flag = %letter, "ignoring unknown robot flag"),
            }
        }
    }
    flags
}

/// Normalize one row into a [`CaptureRecord`].
///
/// # Errors
///
/// - [`Error::MissingField`] when `urlkey`, `timestamp`, `url` or `digest` is absent
/// - [`Error::InvalidField`] for a bad timestamp or a non-numeric number field
pub fn record_from_row(row: &Row) -> Result<CaptureRecord> {
    let url_key = required(row, "urlkey", &["urlkey", "url_key"])?;
    let raw_timestamp = required(row, "timestamp", &["timestamp"])?;
    let timestamp = parse_timestamp(&raw_timestamp).ok_or(Error::InvalidField {
        field: "timestamp",
        value: raw_timestamp,
    })?;
    let url = required(row, "url", &["original", "url"])?;
    let digest = required(row, "digest", &["digest"])?;

    let mut record = CaptureRecord::new(url, url_key, timestamp, digest);
    record.status_code = numeric(row, "status", &["statuscode", "status", "status_code"])?;
    record.mime_type = field(row, &["mimetype", "mime", "mime_type"]);
    record.filename = field(row, &["filename"]);
    record.offset = numeric(row, "offset", &["offset"])?;
    record.length = numeric(row, "length", &["length"])?;
    record.access_policy = field(row, &["access", "access_policy"]);
    record.redirect_url = field(row, &["redirect", "redirect_url"]);
    record.flags = field(row, &["robotflags", "robot_flags", "flags"])
        .map(|text| parse_flags(&text))
        .unwrap_or_default();
    record.collection = field(row, &["collection"]);
    record.source = field(row, &["source"]);
    record.source_collection = field(row, &["source-coll", "source_coll", "source_collection"]);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABULAR: &str = r#"[["urlkey","timestamp","original","mimetype","statuscode","digest","length"],
["com,example)/","20190307123456","https://example.com/","text/html","200","ABCDEF","2048"],
["com,example)/about","20190308000000","https://example.com/about","text/html","-","GHIJKL","-"]]"#;

    const OBJECT_LINES: &str = r#"{"urlkey": "com,example)/", "timestamp": "20190307123456", "url": "https://example.com/", "mime": "text/html", "status": "200", "digest": "ABCDEF", "length": "2048"}
{"urlkey": "com,example)/about", "timestamp": "20190308000000", "url": "https://example.com/about", "mime": "text/html", "digest": "GHIJKL"}
"#;

    const ROW_LINES: &str = r#"["urlkey","timestamp","original","mimetype","statuscode","digest","length"]
["com,example)/","20190307123456","https://example.com/","text/html",200,"ABCDEF",2048]
["com,example)/about","20190308000000","https://example.com/about","text/html",null,"GHIJKL",null]
"#;

    fn records(body: &str) -> Vec<CaptureRecord> {
        parse_page(body)
            .unwrap()
            .rows
            .iter()
            .map(|row| record_from_row(row).unwrap())
            .collect()
    }

    #[test]
    fn every_shape_yields_the_same_records() {
        let tabular = records(TABULAR);

        assert_eq!(tabular.len(), 2);
        assert_eq!(tabular[0].status_code, Some(200));
        assert_eq!(tabular[0].length, Some(2048));
        assert_eq!(tabular[1].status_code, None);
        assert_eq!(tabular[1].length, None);
        assert_eq!(records(OBJECT_LINES), tabular);
        assert_eq!(records(ROW_LINES), tabular);
    }

    #[test]
    fn empty_body_is_an_empty_page() {
        assert_eq!(parse_page("").unwrap(), Page::default());
        assert_eq!(parse_page(" \n ").unwrap(), Page::default());
        assert_eq!(parse_page("[]").unwrap(), Page::default());
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let page = parse_page(r#"[["urlkey","timestamp","original","digest"]]"#).unwrap();
        assert!(page.rows.is_empty());
    }

    #[test]
    fn non_json_first_line_is_rejected() {
        let err = parse_page("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, Error::NotJson { .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn garbage_after_valid_lines_is_rejected() {
        let body = format!("{OBJECT_LINES}not json\n");
        assert!(parse_page(&body).unwrap_err().is_malformed());
    }

    #[test]
    fn resume_key_in_table() {
        let body = r#"[["urlkey","timestamp","original","digest"],
["com,example)/","20190307123456","https://example.com/","ABC"],
[],
["com%2Cexample%29%2F+20190307123456"]]"#;
        let page = parse_page(body).unwrap();

        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.resume_key.as_deref(), Some("com%2Cexample%29%2F+20190307123456"));
    }

    #[test]
    fn resume_key_after_lines() {
        let body = format!("{}\n\nnext-key-123\n", OBJECT_LINES.trim_end());
        let page = parse_page(&body).unwrap();

        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.resume_key.as_deref(), Some("next-key-123"));
    }

    #[test]
    fn missing_mandatory_field_fails() {
        let body = r#"{"urlkey": "com,example)/", "timestamp": "20190307123456", "url": "https://example.com/"}"#;
        let page = parse_page(body).unwrap();
        let err = record_from_row(&page.rows[0]).unwrap_err();

        assert!(matches!(err, Error::MissingField { field: "digest", .. }));
    }

    #[test]
    fn dash_counts_as_missing_for_mandatory_fields() {
        let body = r#"{"urlkey": "com,example)/", "timestamp": "-", "url": "https://example.com/", "digest": "A"}"#;
        let page = parse_page(body).unwrap();

        assert!(matches!(
            record_from_row(&page.rows[0]),
            Err(Error::MissingField { field: "timestamp", .. })
        ));
    }

    #[test]
    fn unknown_flags_are_skipped() {
        let body = r#"{"urlkey": "k", "timestamp": "2019", "url": "u", "digest": "d", "robotflags": "A Q FI G XZ"}"#;
        let record = record_from_row(&parse_page(body).unwrap().rows[0]).unwrap();

        assert_eq!(
            record.flags,
            BTreeSet::from([
                RobotFlag::NoArchive,
                RobotFlag::NoFollow,
                RobotFlag::NoIndex,
                RobotFlag::Legacy,
                RobotFlag::SoftBlock,
            ])
        );
    }

    #[test]
    fn provenance_aliases() {
        let body = r#"{"urlkey": "k", "timestamp": "20200101", "url": "u", "digest": "d", "source": "ia", "source-coll": "web", "collection": "main", "access": "allow", "redirect": "https://example.org/"}"#;
        let record = record_from_row(&parse_page(body).unwrap().rows[0]).unwrap();

        assert_eq!(record.source.as_deref(), Some("ia"));
        assert_eq!(record.source_collection.as_deref(), Some("web"));
        assert_eq!(record.collection.as_deref(), Some("main"));
        assert_eq!(record.access_policy.as_deref(), Some("allow"));
        assert_eq!(record.redirect_url.as_deref(), Some("https://example.org/"));
    }

    #[test]
    fn non_numeric_status_is_invalid() {
        let body = r#"{"urlkey": "k", "timestamp": "2019", "url": "u", "digest": "d", "status": "ok"}"#;
        assert!(matches!(
            record_from_row(&parse_page(body).unwrap().rows[0]),
            Err(Error::InvalidField { field: "status", .. })
        ));
    }

    #[test]
    fn page_count_forms() {
        assert_eq!(parse_page_count("12\n"), Some(12));
        assert_eq!(parse_page_count(r#"{"pages": 3, "pageSize": 5, "blocks": 14}"#), Some(3));
        assert_eq!(parse_page_count("[[\"urlkey\"]]"), None);
        assert_eq!(parse_page_count("nope"), None);
    }
}
