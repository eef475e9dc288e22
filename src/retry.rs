//! Bounded retry helpers for REST requests.
//!
//! Streaming sessions are never retried by this crate; these helpers exist
//! for the short request/response calls in [`rest`](crate::rest), where a
//! robot waking its wifi radio routinely drops the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Controls how many attempts a REST call makes and how long it waits
/// between them.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    /// Delay before the first retry; doubles per retry.
    pub initial_backoff: Duration,
    /// Cap on the doubled delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Default for robots on the local network: three attempts with short
    /// doubling backoff.
    pub fn local_network() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(400),
        }
    }

    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let mut delay = self.initial_backoff;
        for _ in 1..attempt {
            delay = delay.saturating_mul(2).min(self.max_backoff);
        }
        delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::local_network()
    }
}

/// Runs `op` until it succeeds, the policy is exhausted, or `should_retry`
/// rejects the error. `op` receives the 1-based attempt number.
pub(crate) async fn retry_async<T, E, Op, Fut, ShouldRetry>(
    policy: &RetryPolicy,
    mut op: Op,
    mut should_retry: ShouldRetry,
) -> Result<T, E>
where
    Op: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    ShouldRetry: FnMut(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max_attempts || !should_retry(&error) {
                    return Err(error);
                }
                let delay = policy.delay_for_attempt(attempt);
                debug!(
                    event = "rest_attempt_failed",
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::{retry_async, RetryPolicy};

    fn quick_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0usize);
        let result = retry_async(
            &quick_policy(4),
            |_| {
                calls.set(calls.get() + 1);
                let outcome = if calls.get() < 3 { Err("again") } else { Ok("done") };
                async move { outcome }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_when_policy_is_exhausted() {
        let calls = Cell::new(0usize);
        let result: Result<(), &str> = retry_async(
            &quick_policy(2),
            |_| {
                calls.set(calls.get() + 1);
                async { Err("down") }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Err("down"));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_immediately() {
        let calls = Cell::new(0usize);
        let result: Result<(), &str> = retry_async(
            &quick_policy(5),
            |_| {
                calls.set(calls.get() + 1);
                async { Err("bad request") }
            },
            |_| false,
        )
        .await;

        assert_eq!(result, Err("bad request"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(300));
    }
}
