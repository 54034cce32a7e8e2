//! Exponential backoff with jitter for waiter retries.

use crate::error::WaiterError;
use rand::Rng;
use std::time::Duration;

/// Computes the delay to sleep before the next attempt.
///
/// The delay grows exponentially with the attempt count from `min_delay`,
/// saturates at `max_delay`, and is jittered uniformly down toward
/// `min_delay`. It is additionally capped by the remaining wait budget:
/// the cap leaves `min_delay` of headroom while any remains, and the final
/// delay drains the budget entirely so the caller's remaining-time check is
/// guaranteed to terminate the polling loop.
///
/// `attempt` is zero for the first invocation, which sleeps nothing.
///
/// # Errors
///
/// Returns [`WaiterError::InvalidDelay`] when `min_delay` is zero or
/// exceeds `max_delay`.
pub fn compute_delay(
    min_delay: Duration,
    max_delay: Duration,
    remaining: Duration,
    attempt: u32,
) -> Result<Duration, WaiterError> {
    if min_delay > max_delay {
        return Err(WaiterError::InvalidDelay {
            message: "minimum delay must not exceed maximum delay".to_string(),
        });
    }
    if min_delay.is_zero() {
        return Err(WaiterError::InvalidDelay {
            message: "minimum delay must be greater than zero".to_string(),
        });
    }
    if attempt == 0 || remaining.is_zero() {
        return Ok(Duration::ZERO);
    }

    // Attempts past this ceiling would overflow the shift below; they all
    // saturate at max_delay anyway.
    let ratio = (max_delay.as_nanos() / min_delay.as_nanos()).max(1);
    let attempt_ceiling = (ratio as f64).log2() as u32 + 1;

    let mut delay = if attempt > attempt_ceiling || attempt - 1 >= u32::BITS {
        max_delay
    } else {
        min_delay.saturating_mul(1 << (attempt - 1))
    };

    if delay > min_delay {
        // Jitter uniformly between the minimum and the computed delay.
        let span = (delay - min_delay).as_nanos() as u64;
        let jitter = rand::rng().random_range(0..span);
        delay = min_delay + Duration::from_nanos(jitter);
    }

    let cap = remaining.saturating_sub(min_delay);
    if delay > cap {
        // When the cap bottoms out, spend the whole remaining budget so the
        // next iteration's remaining-time check fires.
        delay = if cap.is_zero() { remaining } else { cap };
    }

    Ok(delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(2);
    const MAX: Duration = Duration::from_secs(120);
    const PLENTY: Duration = Duration::from_secs(600);

    #[test]
    fn test_zeroth_attempt_sleeps_nothing() {
        assert_eq!(compute_delay(MIN, MAX, PLENTY, 0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_exhausted_budget_sleeps_nothing() {
        assert_eq!(compute_delay(MIN, MAX, Duration::ZERO, 3).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_first_retry_is_exactly_min_delay() {
        // 2^0 * min == min, so there is no jitter span on attempt one.
        assert_eq!(compute_delay(MIN, MAX, PLENTY, 1).unwrap(), MIN);
    }

    #[test]
    fn test_delay_stays_within_configured_bounds() {
        for attempt in 1..40 {
            let delay = compute_delay(MIN, MAX, PLENTY, attempt).unwrap();
            assert!(delay >= MIN, "attempt {attempt} produced {delay:?} below min");
            assert!(delay <= MAX, "attempt {attempt} produced {delay:?} above max");
        }
    }

    #[test]
    fn test_high_attempts_saturate_at_max() {
        // Past the ceiling the pre-jitter delay is max_delay; the jittered
        // value still lands in [min, max].
        let delay = compute_delay(MIN, MAX, PLENTY, 1000).unwrap();
        assert!(delay >= MIN && delay <= MAX);
    }

    #[test]
    fn test_cap_leaves_min_delay_of_headroom() {
        // Enough budget for one more capped sleep plus the minimum.
        let remaining = Duration::from_secs(5);
        for _ in 0..50 {
            let delay = compute_delay(MIN, MAX, remaining, 6).unwrap();
            assert!(delay <= remaining - MIN);
        }
    }

    #[test]
    fn test_final_delay_drains_remaining_budget() {
        // remaining <= min: the cap bottoms out and the delay becomes the
        // whole remaining budget.
        let remaining = Duration::from_secs(2);
        assert_eq!(compute_delay(MIN, MAX, remaining, 4).unwrap(), remaining);

        let remaining = Duration::from_millis(500);
        assert_eq!(compute_delay(MIN, MAX, remaining, 4).unwrap(), remaining);
    }

    #[test]
    fn test_inverted_configuration_is_rejected() {
        let err = compute_delay(MAX, MIN, PLENTY, 1).unwrap_err();
        assert!(matches!(err, WaiterError::InvalidDelay { .. }));
    }

    #[test]
    fn test_zero_min_delay_is_rejected() {
        let err = compute_delay(Duration::ZERO, MAX, PLENTY, 1).unwrap_err();
        assert!(matches!(err, WaiterError::InvalidDelay { .. }));
    }

    #[test]
    fn test_equal_min_and_max_is_constant() {
        let delay = compute_delay(MIN, MIN, PLENTY, 7).unwrap();
        assert_eq!(delay, MIN);
    }
}
