//! I/O operations: the HTTP client seam, the per-host limiter and the
//! retrying session built on top of both.

mod http;
mod limiter;
mod session;

pub use http::{HttpClient, TransportError};
pub use limiter::HostLimiter;
pub use session::Session;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
