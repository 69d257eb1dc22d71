//! Bounded retry policy for paginated fetches

use std::time::Duration;

use crate::config::retry;

/// Retry and backoff settings injected into a [`Fetcher`](super::Fetcher)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive 429 responses tolerated on one page
    pub max_rate_limit_retries: u32,
    /// Wait applied to a 429 that carries no Retry-After header
    pub rate_limit_delay: Duration,
    /// Retries after network errors, timeouts, 408 and 5xx
    pub max_transient_retries: u32,
    /// First transient backoff delay
    pub base_delay: Duration,
    /// Backoff growth factor
    pub multiplier: u32,
    /// Pause between successful page requests
    pub page_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: retry::MAX_RATE_LIMIT_RETRIES,
            rate_limit_delay: Duration::from_secs(retry::RATE_LIMIT_DELAY_SECS),
            max_transient_retries: retry::MAX_TRANSIENT_RETRIES,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            multiplier: retry::BACKOFF_MULTIPLIER,
            page_pause: Duration::from_millis(retry::PAGE_PAUSE_MS),
        }
    }
}

impl RetryPolicy {
    /// Same retry counts as the default policy, but every delay is zero
    pub fn immediate() -> Self {
        Self {
            rate_limit_delay: Duration::ZERO,
            base_delay: Duration::ZERO,
            page_pause: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before transient retry number `attempt` (0-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Delay before retrying a rate-limited page
    pub fn rate_limit_wait(&self, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or(self.rate_limit_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_rate_limit_retries, 5);
        assert_eq!(policy.rate_limit_delay, Duration::from_secs(60));
        assert_eq!(policy.max_transient_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 2);
    }

    #[test]
    fn test_backoff_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_immediate_policy_has_no_delays() {
        let policy = RetryPolicy::immediate();
        assert_eq!(policy.backoff_delay(3), Duration::ZERO);
        assert_eq!(policy.rate_limit_wait(None), Duration::ZERO);
        assert_eq!(policy.page_pause, Duration::ZERO);
        assert_eq!(policy.max_rate_limit_retries, 5);
    }

    #[test]
    fn test_retry_after_overrides_default() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.rate_limit_wait(Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert_eq!(policy.rate_limit_wait(None), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_multiplier_does_not_collapse_delay() {
        let policy = RetryPolicy {
            multiplier: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(1));
    }
}
