//! Bounded retry for transient address failures.
//!
//! # Responsibilities
//! - Cap attempts per address per cycle
//! - Space attempts with exponential backoff + jitter
//!
//! # Design Decisions
//! - Only `AddressError::Transient` is retried; the caller decides that
//! - Whatever is still failing after the last attempt waits for the next cycle

use std::time::Duration;

use rand::Rng;

use crate::config::schema::RetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before retrying after `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay_ms, config.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Exponential backoff capped at `max_ms`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(calculate_backoff(0, 100, 1000), Duration::ZERO);

        let first = calculate_backoff(1, 100, 1000).as_millis();
        assert!((100..110).contains(&first));

        let second = calculate_backoff(2, 100, 1000).as_millis();
        assert!((200..220).contains(&second));

        let capped = calculate_backoff(30, 100, 1000).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn test_attempt_bound() {
        let policy = RetryPolicy::new(3, 10, 100);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, 10, 100);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.should_retry(1));
    }
}
