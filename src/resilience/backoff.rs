//! Delay between poll attempts.
//!
//! The delay after attempt `n` is `initial_interval * 2^(n-1)`, capped at
//! `max_interval`, plus up to 10% jitter so parallel runs do not query the
//! trace API in lockstep.

use std::time::Duration;

use rand::Rng;

use crate::resilience::poll::PollPolicy;

impl PollPolicy {
    /// Delay to wait after the 1-based `attempt` before the next one.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        base + jitter(base)
    }

    /// Delay without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let Some(doublings) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let factor = 1u32.checked_shl(doublings).unwrap_or(u32::MAX);
        self.initial_interval
            .checked_mul(factor)
            .map_or(self.max_interval, |d| d.min(self.max_interval))
    }
}

fn jitter(delay: Duration) -> Duration {
    let range = delay / 10;
    if range.is_zero() {
        return Duration::ZERO;
    }
    rand::thread_rng().gen_range(Duration::ZERO..range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PollPolicy {
        PollPolicy {
            max_wait: Duration::from_secs(20),
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_millis(2000),
            retry_on_error: true,
        }
    }

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let policy = policy();
        assert_eq!(policy.base_delay(1), Duration::from_millis(500));
        assert_eq!(policy.base_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(3), Duration::from_millis(2000));
        assert_eq!(policy.base_delay(40), Duration::from_millis(2000));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let policy = policy();
        for attempt in 1..6 {
            let base = policy.base_delay(attempt);
            let delay = policy.delay(attempt);
            assert!(delay >= base && delay < base + base / 10 + Duration::from_nanos(1), "{:?}", delay);
        }
    }

    #[test]
    fn test_sub_millisecond_intervals_are_kept() {
        let policy = PollPolicy {
            initial_interval: Duration::from_micros(300),
            max_interval: Duration::from_micros(900),
            ..policy()
        };
        assert_eq!(policy.base_delay(2), Duration::from_micros(600));
        assert_eq!(policy.base_delay(3), Duration::from_micros(900));
    }

    #[test]
    fn test_no_delay_before_first_attempt() {
        assert_eq!(policy().delay(0), Duration::ZERO);
    }
}
