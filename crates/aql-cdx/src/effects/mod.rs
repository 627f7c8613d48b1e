//! Network-facing discovery: the client and its pagination cursor.

mod client;
mod cursor;

pub use client::CdxClient;
pub use cursor::CaptureCursor;
