use bytes::Bytes;

use crate::record::WarcRecord;
use crate::{Error, Result};

const CRLF: &[u8] = b"\r\n";
const RECORD_TRAILER: &[u8] = b"\r\n\r\n";

impl WarcRecord {
    /// Serialize as an uncompressed WARC record, trailer included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.block.len() + 512);
        out.extend_from_slice(self.version.as_bytes());
        out.extend_from_slice(CRLF);
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF);
        }
        out.extend_from_slice(CRLF);
        out.extend_from_slice(&self.block);
        out.extend_from_slice(RECORD_TRAILER);
        out
    }

    /// Parse one record from the start of `data`.
    ///
    /// Returns the record and the number of bytes it occupied, trailer included.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let mut pos = 0;
        let version = next_line(data, &mut pos).ok_or(Error::MissingVersion)?;
        let version = std::str::from_utf8(version).map_err(|_| Error::MissingVersion)?;
        if !version.starts_with("WARC/") {
            return Err(Error::MissingVersion);
        }

        let mut headers = Vec::new();
        loop {
            let line = next_line(data, &mut pos).ok_or(Error::Truncated {
                expected: pos + 2,
                actual:   data.len(),
            })?;
            if line.is_empty() {
                break;
            }
            let line = String::from_utf8_lossy(line);
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::MalformedHeader(line.to_string()))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .ok_or(Error::MissingContentLength)?;

        let record_end = pos
            .checked_add(length)
            .and_then(|end| end.checked_add(RECORD_TRAILER.len()))
            .ok_or(Error::Truncated {
                expected: usize::MAX,
                actual:   data.len(),
            })?;
        let block_end = record_end - RECORD_TRAILER.len();
        if data.len() < record_end {
            return Err(Error::Truncated {
                expected: record_end,
                actual:   data.len(),
            });
        }

        let record = Self {
            version: version.to_string(),
            headers,
            block: Bytes::copy_from_slice(&data[pos..block_end]),
        };
        Ok((record, record_end))
    }
}

fn next_line<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let rest = data.get(*pos..)?;
    let end = rest.windows(2).position(|w| w == CRLF)?;
    *pos += end + 2;
    Some(&rest[..end])
}
