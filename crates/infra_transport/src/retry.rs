//! Backoff schedule for retryable transport failures

use std::time::Duration;

/// Delay before the attempt following `failed_attempt` (1-based)
///
/// Exponential: `base * 2^(failed_attempt - 1)`, capped. The schedule is
/// strictly increasing until it reaches the cap.
pub fn backoff_delay(failed_attempt: u32, base: Duration, cap: Duration) -> Duration {
    let factor = 2u32.saturating_pow(failed_attempt.saturating_sub(1));
    base.saturating_mul(factor).min(cap)
}
