//! Discovery of archived captures through CDX-style index APIs.
//!
//! # Architecture
//!
//! - [`data`] - [`CaptureRecord`], [`MatchScope`], [`RobotFlag`] and client options
//! - [`core`] - Scope canonicalization, query building and response parsing
//! - [`effects`] - [`CdxClient`] and the pagination [`CaptureCursor`]
//!
//! Two pagination strategies are supported. When the index reports a page
//! count, pages are fetched concurrently (bounded by the session's per-host
//! limit) and re-ordered by page index. Otherwise the client follows resume
//! keys, one request after another, until a response carries none.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use core::{CaptureQuery, ResolvedQuery, parse_page, parse_page_count};
pub use data::{
    CaptureRecord, CdxOptions, DEFAULT_ENDPOINT, DiscoveryProgress, MatchScope, RobotFlag,
    format_timestamp, parse_timestamp, parse_timestamp_upper,
};
pub use effects::{CaptureCursor, CdxClient};
pub use error::{Error, Result};
