//! Retry policies with exponential backoff
//!
//! Two policies cover every request the data-access layer issues:
//!
//! - [`RetryPolicy::reads`]: network failures and 5xx responses are retried up to
//!   three times; 4xx responses are final except 408 and 429, which get two
//!   retries. The n-th retry (0-based) waits `min(1s * 2^n, 30s)`.
//! - [`RetryPolicy::writes`]: a single retry after one second, and only for
//!   failures a read would also retry.
//!
//! The policy only decides; the caller owns the loop and the sleeping.
//!
//! # Example
//!
//! ```rust
//! use libris_core::retry::{FailureClass, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::reads();
//! assert!(policy.should_retry(0, FailureClass::Server(503)));
//! assert!(!policy.should_retry(0, FailureClass::Client(404)));
//! assert_eq!(policy.delay_for_retry(1), Duration::from_secs(2));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a failed attempt failed, as far as retrying is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// No response was received (connect error, reset, timeout)
    Network,
    /// The server answered with a 4xx status
    Client(u16),
    /// The server answered with a 5xx status
    Server(u16),
    /// Anything retrying cannot fix (bad payload, decode error, configuration)
    Permanent,
}

impl FailureClass {
    /// Classify an HTTP status code
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => Self::Client(status),
            500..=599 => Self::Server(status),
            _ => Self::Permanent,
        }
    }

    /// Whether this is a request-timeout or too-many-requests answer
    #[must_use]
    pub fn is_throttled(self) -> bool {
        matches!(self, Self::Client(408 | 429))
    }
}

/// Errors that can be classified for retrying
pub trait Retryable {
    /// Classify this failure
    fn failure_class(&self) -> FailureClass;
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed after network failures and 5xx responses
    pub max_retries: u32,
    /// Retries allowed after 408 and 429 responses
    pub throttled_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied per retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reads()
    }
}

impl RetryPolicy {
    /// Policy for reads (queries)
    #[must_use]
    pub fn reads() -> Self {
        Self {
            max_retries: 3,
            throttled_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Policy for writes (mutations)
    #[must_use]
    pub fn writes() -> Self {
        Self {
            max_retries: 1,
            throttled_retries: 1,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
        }
    }

    /// Policy that never retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            throttled_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Same retry counts with millisecond delays, for scripts and tests
    #[must_use]
    pub fn quick(self) -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            ..self
        }
    }

    /// Decide whether to retry after `retries_done` retries have already failed
    #[must_use]
    pub fn should_retry(&self, retries_done: u32, class: FailureClass) -> bool {
        match class {
            FailureClass::Network | FailureClass::Server(_) => retries_done < self.max_retries,
            c if c.is_throttled() => retries_done < self.throttled_retries,
            FailureClass::Client(_) | FailureClass::Permanent => false,
        }
    }

    /// Delay before retry number `retries_done` (0-based)
    #[must_use]
    pub fn delay_for_retry(&self, retries_done: u32) -> Duration {
        let exponent = i32::try_from(retries_done).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());

        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }

    /// Maximum number of attempts this policy can make for a failure class
    #[must_use]
    pub fn max_attempts(&self, class: FailureClass) -> u32 {
        let mut retries = 0;
        while self.should_retry(retries, class) {
            retries += 1;
        }
        retries + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_retry_server_errors_three_times() {
        let policy = RetryPolicy::reads();
        let class = FailureClass::Server(500);

        assert!(policy.should_retry(0, class));
        assert!(policy.should_retry(2, class));
        assert!(!policy.should_retry(3, class));
        assert_eq!(policy.max_attempts(class), 4);
    }

    #[test]
    fn test_reads_do_not_retry_not_found() {
        let policy = RetryPolicy::reads();
        assert!(!policy.should_retry(0, FailureClass::Client(404)));
        assert_eq!(policy.max_attempts(FailureClass::Client(404)), 1);
    }

    #[test]
    fn test_reads_retry_throttling_twice() {
        let policy = RetryPolicy::reads();
        for status in [408, 429] {
            let class = FailureClass::from_status(status);
            assert!(policy.should_retry(1, class));
            assert!(!policy.should_retry(2, class));
        }
    }

    #[test]
    fn test_reads_retry_network_failures() {
        let policy = RetryPolicy::reads();
        assert_eq!(policy.max_attempts(FailureClass::Network), 4);
        assert_eq!(policy.max_attempts(FailureClass::Permanent), 1);
    }

    #[test]
    fn test_writes_retry_once() {
        let policy = RetryPolicy::writes();
        assert!(policy.should_retry(0, FailureClass::Server(502)));
        assert!(!policy.should_retry(1, FailureClass::Server(502)));
        assert!(!policy.should_retry(0, FailureClass::Client(400)));
        assert_eq!(policy.delay_for_retry(0), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_calculation() {
        let policy = RetryPolicy::reads();

        assert_eq!(policy.delay_for_retry(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_retry(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for_retry(40), Duration::from_secs(30));
    }

    #[test]
    fn test_delays_never_decrease() {
        let policy = RetryPolicy::reads();
        let delays: Vec<_> = (0..10).map(|n| policy.delay_for_retry(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert!(!policy.should_retry(0, FailureClass::Network));
        assert_eq!(policy.delay_for_retry(3), Duration::ZERO);
    }

    #[test]
    fn test_quick_keeps_counts() {
        let policy = RetryPolicy::reads().quick();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for_retry(9), Duration::from_millis(100));
    }

    #[test]
    fn test_from_status() {
        assert_eq!(FailureClass::from_status(503), FailureClass::Server(503));
        assert_eq!(FailureClass::from_status(403), FailureClass::Client(403));
        assert_eq!(FailureClass::from_status(302), FailureClass::Permanent);
    }
}
