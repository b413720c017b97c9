// Bounded retry with exponential backoff.
//
// Every remote call in the pipeline goes through `RetryPolicy`. The outcome
// is tagged so callers can tell a first-try success from a call that only
// succeeded after several attempts, or one that gave up.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Error;

/// Retry schedule for remote calls.
///
/// `delay(n) = clamp(multiplier * 2^(n-1) * jitter(n), min_delay, max_delay)`
/// where `n` is the 1-based number of the attempt that just failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Lower bound on the wait between attempts. Default: 5s.
    pub min_delay: Duration,
    /// Upper bound on the wait between attempts. Default: 30s.
    pub max_delay: Duration,
    /// Base multiplier in seconds. Default: 1.0.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            multiplier: 1.0,
        }
    }
}

/// Result of a retried operation, tagged with the number of attempts made.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The operation succeeded.
    Success { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error; `error` is the last one.
    Exhausted { error: Error, attempts: u32 },
    /// A non-retryable error stopped the loop early.
    Aborted { error: Error, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    /// Number of attempts that were made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Collapse into a plain `Result`, surfacing the last error.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Exhausted { error, .. } | Self::Aborted { error, .. } => Err(error),
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` and no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 0.0,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 2.0_f64.powi(i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX));
        let base = self.multiplier.max(0.0) * exp;

        // Deterministic jitter seeded from the attempt number.
        let jitter = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
        let secs = (base * jitter)
            .max(self.min_delay.as_secs_f64())
            .min(self.max_delay.as_secs_f64().max(self.min_delay.as_secs_f64()));

        if secs.is_finite() {
            Duration::from_secs_f64(secs.max(0.0))
        } else {
            self.max_delay
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run_tagged<T, F, Fut>(&self, operation: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max = self.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "succeeded after retry");
                    }
                    return RetryOutcome::Success {
                        value,
                        attempts: attempt,
                    };
                }
                Err(error) if !error.is_retryable() => {
                    return RetryOutcome::Aborted {
                        error,
                        attempts: attempt,
                    };
                }
                Err(error) if attempt >= max => {
                    warn!(operation, attempts = attempt, error = %error, "giving up");
                    return RetryOutcome::Exhausted {
                        error,
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        remaining = max - attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "request failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// Like [`run_tagged`](Self::run_tagged), collapsed into a `Result`.
    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.run_tagged(operation, op).await.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn http_error() -> Error {
        Error::Http {
            status: 503,
            endpoint: "/test".into(),
            preview: String::new(),
        }
    }

    #[test]
    fn default_policy_matches_schedule_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 7);
        for attempt in 1..=10 {
            let d = policy.delay_for(attempt);
            assert!(d >= Duration::from_secs(5), "attempt {attempt}: {d:?}");
            assert!(d <= Duration::from_secs(30), "attempt {attempt}: {d:?}");
        }
        // Late attempts saturate at the cap.
        assert_eq!(policy.delay_for(9), Duration::from_secs(30));
    }

    #[test]
    fn immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(5), Duration::ZERO);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<()> = RetryPolicy::immediate(7)
            .run_tagged("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(http_error()) }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 7, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let outcome = RetryPolicy::immediate(7)
            .run_tagged("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(http_error()) } else { Ok(n) } }
            })
            .await;

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.into_result().unwrap(), 2);
    }

    #[tokio::test]
    async fn permanent_errors_abort_immediately() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<()> = RetryPolicy::immediate(7)
            .run_tagged("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(Error::Deserialization {
                        message: "bad".into(),
                        body: String::new(),
                    })
                }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Aborted { attempts: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let outcome = RetryPolicy::immediate(0)
            .run_tagged("test", || async { Ok::<_, Error>(1) })
            .await;
        assert_eq!(outcome.attempts(), 1);
    }
}
