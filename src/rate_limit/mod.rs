//! Backoff and pacing helpers for requests against rate-limited upstreams.
//!
//! Used by the retrying fetcher (waits between attempts) and by the
//! prefetch worker (fixed pause between queue items).

use std::time::Duration;

/// Wait before the first retry. Each further retry doubles it.
pub const BASE_BACKOFF: Duration = Duration::from_millis(1000);

/// Ceiling for any single backoff wait.
pub const MAX_BACKOFF: Duration = Duration::from_millis(5000);

/// Check if a status code is worth retrying (rate limited or server error).
pub fn is_retryable_status(status_code: u16) -> bool {
    status_code == 429 || (500..600).contains(&status_code)
}

/// Parse Retry-After header value (seconds).
/// Returns duration to wait, or None if header is missing/invalid.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Calculate exponential backoff delay after the given 1-based attempt.
///
/// `base * 2^(attempt-1)`, clamped to `max`.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let delay_ms = (base.as_millis() as u64).saturating_mul(1u64 << exponent);
    Duration::from_millis(delay_ms).min(max)
}

/// Get delay from environment variable, with default fallback.
pub fn get_delay_from_env(env_var: &str, default_ms: u64) -> Duration {
    std::env::var(env_var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(default_ms))
}
