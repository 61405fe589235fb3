//! Retry policy for canvas fetch attempts.
//!
//! Every failed attempt is classified into a [`FailureType`]; the
//! [`RetryPolicy`] then decides, from the classification and the attempt
//! count, whether to try again and how long to wait.
//!
//! The wait is a [`Backoff`]. The default is a fixed delay between attempts;
//! exponential growth is available but only when a caller asks for it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use libros_core::fetch::{FetchError, FailureType, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://iiif.example.org/canvas/1.jpf", 503);
//! assert_eq!(classify_error(&error), FailureType::Transient);
//!
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(5));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("unexpected: {reason}"),
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::FetchError;

/// Default number of attempts per resource (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Maximum jitter added to exponential delays.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of fetch failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on a later attempt: network errors, timeouts, any non-2xx status.
    Transient,

    /// Will not succeed on retry: malformed URL or an undecodable body.
    Permanent,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(Duration),

    /// `min(base * 2^(attempt-1), max)` plus up to 500ms of jitter.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Cap before jitter.
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed(DEFAULT_BACKOFF)
    }
}

impl Backoff {
    /// Delay after the given failed attempt (1-indexed).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max) + jitter()
            }
        }
    }

    /// Same strategy with a new delay; for exponential backoff this is the base.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        match self {
            Self::Fixed(_) => Self::Fixed(delay),
            Self::Exponential { max, .. } => Self::Exponential { base: delay, max },
        }
    }
}

fn jitter() -> Duration {
    let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Retry configuration for one resource.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `backoff`: fixed 5 seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Wait between attempts.
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Creates a policy with a fixed delay between attempts.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }

    /// Creates a policy with a custom max_attempts and the default backoff.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::default())
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the configured backoff.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.backoff.delay_after(attempt);
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a fetch error for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Network | Transient |
/// | Timeout | Transient |
/// | HttpStatus (any) | Transient |
/// | InvalidUrl | Permanent |
/// | Decode | Permanent |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::Network { .. } | FetchError::Timeout { .. } | FetchError::HttpStatus { .. } => {
            FailureType::Transient
        }
        FetchError::InvalidUrl { .. } | FetchError::Decode { .. } => FailureType::Permanent,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(), Backoff::Fixed(Duration::from_secs(5)));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let policy = RetryPolicy::with_max_attempts(1);
        let decision = policy.should_retry(FailureType::Transient, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    // ==================== Backoff Tests ====================

    #[test]
    fn test_fixed_backoff_is_constant() {
        let backoff = Backoff::Fixed(Duration::from_secs(5));
        assert_eq!(backoff.delay_after(1), Duration::from_secs(5));
        assert_eq!(backoff.delay_after(2), Duration::from_secs(5));
        assert_eq!(backoff.delay_after(10), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_backoff_doubles_with_jitter() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(32),
        };
        let first = backoff.delay_after(1);
        assert!(first >= Duration::from_secs(1) && first <= Duration::from_millis(1500));
        let third = backoff.delay_after(3);
        assert!(third >= Duration::from_secs(4) && third <= Duration::from_millis(4500));
    }

    #[test]
    fn test_exponential_backoff_respects_max() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(5),
        };
        let delay = backoff.delay_after(40);
        assert!(delay >= Duration::from_secs(5) && delay <= Duration::from_millis(5500));
    }

    // ==================== Error Classification Tests ====================

    #[test]
    fn test_with_delay_keeps_strategy() {
        assert_eq!(
            Backoff::Fixed(Duration::from_secs(5)).with_delay(Duration::from_secs(1)),
            Backoff::Fixed(Duration::from_secs(1))
        );
        let exponential = Backoff::Exponential {
            base: Duration::from_secs(2),
            max: Duration::from_secs(40),
        };
        assert_eq!(
            exponential.with_delay(Duration::from_secs(1)),
            Backoff::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(40),
            }
        );
    }

    #[test]
    fn test_classify_every_http_status_transient() {
        for status in [400, 404, 408, 429, 500, 502, 503, 504] {
            let error = FetchError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Transient, "status {status}");
        }
    }

    #[test]
    fn test_classify_timeout_transient() {
        let error = FetchError::timeout("http://example.com");
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_invalid_url_permanent() {
        let error = FetchError::invalid_url("not-a-url");
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_classify_decode_permanent() {
        let error = FetchError::decode("http://example.com", "expected value at line 1");
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    // ==================== Should Retry Decision Tests ====================

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 1);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("permanent"));
        } else {
            panic!("Expected DoNotRetry, got {decision:?}");
        }
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(10));

        let decision = policy.should_retry(FailureType::Transient, 1);
        assert_eq!(
            decision,
            RetryDecision::Retry {
                delay: Duration::from_millis(10),
                attempt: 2
            }
        );

        let decision = policy.should_retry(FailureType::Transient, 2);
        assert!(matches!(decision, RetryDecision::Retry { attempt: 3, .. }));

        let decision = policy.should_retry(FailureType::Transient, 3);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("exhausted"));
        } else {
            panic!("Expected DoNotRetry, got {decision:?}");
        }
    }
}
