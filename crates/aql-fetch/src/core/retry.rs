use std::time::Duration;

use rand::Rng;

/// Calculate the backoff ceiling before a retry attempt.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Arguments
///
/// * `retry_count` - The current retry number (0-indexed: 0 = first retry)
/// * `base` - The base delay duration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use aql_fetch::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(1, Duration::from_millis(100)), Duration::from_millis(200));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// Full-jitter backoff: a uniformly random delay in `[0, min(cap, base * 2^retry_count)]`.
///
/// Spreading retries over the whole window keeps many concurrent pipelines
/// from hammering a rate-limited archive in lockstep.
pub fn jittered_delay<R: Rng + ?Sized>(
    retry_count: u32,
    base: Duration,
    cap: Duration,
    rng: &mut R,
) -> Duration {
    let ceiling = retry_delay(retry_count, base).min(cap);
    let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.gen_range(0..=nanos))
}

/// Whether `status` belongs to the configured retryable set.
pub fn is_retryable_status(status: u16, retryable: &[u16]) -> bool { retryable.contains(&status) }

/// Whether a `Retry-After` header on `status` bounds the next delay.
///
/// Only rate limiting (429) and maintenance (503) responses carry a
/// meaningful hint.
pub fn honors_retry_after(status: u16) -> bool { matches!(status, 429 | 503) }
