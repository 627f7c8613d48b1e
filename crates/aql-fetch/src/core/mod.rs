//! Pure transformations for the retrying session.
//!
//! Nothing in here performs I/O; the effects layer feeds these functions
//! with attempt counters, statuses and a random source.

mod retry;

pub use retry::{honors_retry_after, is_retryable_status, jittered_delay, retry_delay};
