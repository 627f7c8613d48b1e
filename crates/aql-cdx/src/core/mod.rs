//! Pure transformations: query canonicalization and response parsing.

mod parse;
mod query;

pub use parse::{Page, parse_page, parse_page_count, record_from_row};
pub use query::{CaptureQuery, ResolvedQuery};
