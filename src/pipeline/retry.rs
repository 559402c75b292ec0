//! Exponential backoff for fetch retries and scheduler restarts.

use std::time::Duration;

use crate::models::IngestConfig;

/// Doubling delay with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// Delay after the `failures`-th consecutive failure (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let shift = failures.saturating_sub(1).min(16);
        let factor = 1u32 << shift;
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Bounded retry settings for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Backoff) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            config.fetch_attempts,
            Backoff::new(
                Duration::from_millis(config.backoff_base_ms),
                Duration::from_millis(config.backoff_max_ms),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_until_cap() {
        let backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(10));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
        assert_eq!(backoff.delay(4), Duration::from_secs(10));
        assert_eq!(backoff.delay(500), Duration::from_secs(10));
    }

    #[test]
    fn test_max_never_below_base() {
        let backoff = Backoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(5));
    }

    #[test]
    fn test_policy_from_default_config() {
        let policy = RetryPolicy::from_config(&IngestConfig::default());
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.backoff.delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff.delay(10), Duration::from_secs(60));
    }

    #[test]
    fn test_policy_needs_one_attempt() {
        let backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(RetryPolicy::new(0, backoff).attempts, 1);
    }
}
