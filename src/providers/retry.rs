//! Retry policy for transient completion failures
//!
//! Replaces the inline retry loop that providers would otherwise carry
//! with a small policy object: a total attempt budget, a retryable-status
//! predicate, and a backoff function. The policy is deliberately tiny so
//! it can be unit tested without any network involved.

use std::time::Duration;

/// Outcome of a single failed attempt, as seen by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The provider answered with a non-2xx HTTP status
    Status(u16),
    /// The request never produced a usable response (connect error,
    /// timeout, broken transfer)
    Network,
}

/// Bounded retry policy with a fixed backoff
///
/// The default policy mirrors the upstream behavior this crate was built
/// against: two attempts total, retry only on HTTP 429 or 5xx (or a
/// network-level failure), and a fixed one-second pause between attempts.
/// The backoff curve is an implementation choice, not a contract; keeping
/// it fixed keeps the policy predictable under test.
///
/// # Examples
///
/// ```
/// use chatling::providers::{AttemptFailure, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// assert!(policy.should_retry(1, AttemptFailure::Status(429)));
/// assert!(!policy.should_retry(1, AttemptFailure::Status(400)));
/// assert!(!policy.should_retry(2, AttemptFailure::Status(429)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt budget and backoff
    ///
    /// `max_attempts` counts every attempt including the first; it is
    /// clamped to at least 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use chatling::providers::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(3, Duration::from_millis(250));
    /// assert_eq!(policy.max_attempts(), 3);
    /// ```
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Total attempt budget, including the first attempt
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether an HTTP status is considered transient
    ///
    /// Rate limiting (429) and server-side failures (5xx) are retryable;
    /// everything else is not.
    pub fn retryable_status(status: u16) -> bool {
        status == 429 || status >= 500
    }

    /// Decide whether another attempt should be made
    ///
    /// # Arguments
    ///
    /// * `attempt` - The 1-based number of the attempt that just failed
    /// * `failure` - How that attempt failed
    pub fn should_retry(&self, attempt: u32, failure: AttemptFailure) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match failure {
            AttemptFailure::Status(status) => Self::retryable_status(status),
            AttemptFailure::Network => true,
        }
    }

    /// Delay to observe before the next attempt
    ///
    /// Fixed backoff; the attempt number is accepted so an exponential
    /// curve can be swapped in without touching call sites.
    pub fn delay(&self, _attempt: u32) -> Duration {
        self.backoff
    }

    /// Sleep for the configured backoff before retrying
    pub async fn wait(&self, attempt: u32) {
        tokio::time::sleep(self.delay(attempt)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_two_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
    }

    #[test]
    fn test_max_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.should_retry(1, AttemptFailure::Network));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::retryable_status(429));
        assert!(RetryPolicy::retryable_status(500));
        assert!(RetryPolicy::retryable_status(503));
        assert!(!RetryPolicy::retryable_status(400));
        assert!(!RetryPolicy::retryable_status(401));
        assert!(!RetryPolicy::retryable_status(403));
        assert!(!RetryPolicy::retryable_status(404));
    }

    #[test]
    fn test_should_retry_transient_within_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, AttemptFailure::Status(429)));
        assert!(policy.should_retry(1, AttemptFailure::Status(500)));
        assert!(policy.should_retry(1, AttemptFailure::Network));
    }

    #[test]
    fn test_should_not_retry_client_errors() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(1, AttemptFailure::Status(400)));
        assert!(!policy.should_retry(1, AttemptFailure::Status(401)));
    }

    #[test]
    fn test_should_not_retry_past_budget() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(2, AttemptFailure::Status(429)));
        assert!(!policy.should_retry(2, AttemptFailure::Network));
        assert!(!policy.should_retry(3, AttemptFailure::Status(503)));
    }

    #[test]
    fn test_delay_is_fixed_across_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(250));
        assert_eq!(policy.delay(1), policy.delay(2));
    }
}
