//! Data layer: immutable session configuration and HTTP exchange types.

mod options;
mod request;

pub use options::{SessionOptions, duration_ms};
pub use request::{HttpRequest, HttpResponse, HttpVersion};
