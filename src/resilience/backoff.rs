//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before retry number `attempt`, doubling from `base_ms` up to `max_ms`
/// with up to 10% jitter on top.
///
/// `attempt` is 1-based; attempt 0 yields no delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    backoff_with_jitter(&mut rand::thread_rng(), attempt, base_ms, max_ms)
}

/// [`calculate_backoff`] drawing its jitter from `rng`.
pub fn backoff_with_jitter<R: Rng + ?Sized>(rng: &mut R, attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let Some(doublings) = attempt.checked_sub(1) else {
        return Duration::ZERO;
    };

    let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor).min(max_ms);
    let jitter_ms = match delay_ms / 10 {
        0 => 0,
        spread => rng.gen_range(0..spread),
    };

    Duration::from_millis(delay_ms + jitter_ms)
}
