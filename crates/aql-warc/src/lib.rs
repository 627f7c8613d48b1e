//! WARC records and independently decompressible gzip envelopes.
//!
//! # Architecture
//!
//! - `record.rs` - The [`WarcRecord`] model and its typed constructors
//! - `codec.rs` - Plain WARC/1.1 serialization and parsing
//! - `envelope.rs` - One gzip member per record, so every record can be
//!   decoded from its own byte range without touching its neighbours
//!
//! This crate writes, measures and reads records back. It never interprets
//! HTTP payloads inside a record block.

mod codec;
mod envelope;
mod error;
mod record;

pub use envelope::{GZIP_MAGIC, decode_member, encode_member, read_members};
pub use error::{Error, Result};
pub use record::{WARC_VERSION, WarcRecord, WarcRecordType};
