//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// First delay after a transient accept error.
pub const ACCEPT_BASE_DELAY_MS: u64 = 5;

/// Ceiling for accept retry delays.
pub const ACCEPT_MAX_DELAY_MS: u64 = 1_000;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay before retrying accept after `consecutive` transient failures in a row.
pub fn accept_backoff(consecutive: u32) -> Duration {
    calculate_backoff(consecutive, ACCEPT_BASE_DELAY_MS, ACCEPT_MAX_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
    }

    #[test]
    fn accept_backoff_is_capped() {
        assert_eq!(accept_backoff(1), Duration::from_millis(5));
        let late = accept_backoff(40);
        assert!(late >= Duration::from_millis(ACCEPT_MAX_DELAY_MS));
        assert!(late < Duration::from_millis(ACCEPT_MAX_DELAY_MS * 11 / 10));
    }
}
