//! Capture loading through a Memento-style archive API.
//!
//! Captures are requested from the raw `id_` endpoint, so the returned bytes
//! are the ones the archive stored rather than a rewritten replay page.
//! [`CaptureLoader::load_as_records`] additionally records the exchange as a
//! linked pair of WARC `request` and `response` records.

mod core;
mod data;
mod effects;
mod error;

pub use core::{memento_url, reason_phrase, request_block, response_block};
pub use data::{CaptureTarget, DEFAULT_BASE_URL, MementoOptions};
pub use effects::CaptureLoader;
pub use error::{Error, Result};
