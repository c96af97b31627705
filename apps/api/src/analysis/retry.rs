//! Bounded retry with linear backoff.
//!
//! Knows nothing about the operation it wraps: the same policy is used for
//! conversation creation, message submission, run creation, run polling and
//! result retrieval.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, including the first one. Treated as at least 1.
    pub max_attempts: u32,
    /// Delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Runs `operation` until it succeeds or `max_attempts` is exhausted.
    /// The last error is returned unmodified.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.base_delay * attempt;
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Attempt {}/{} failed, retrying after {}ms",
                        attempt,
                        max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_operation_runs_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let result: Result<(), String> = policy
            .run("always-fails", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {n}"))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "failure 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_second_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let result: Result<&str, String> = policy
            .run("flaky", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient".to_string())
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_linear() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        let start = Instant::now();

        let _: Result<(), &str> = policy.run("timed", || async { Err("nope") }).await;

        // 100 + 200 + 300ms, no sleep after the last attempt.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(600), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(650), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let policy = RetryPolicy::default();
        let start = Instant::now();

        let result: Result<u8, String> = policy.run("ok", || async { Ok(7) }).await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_invokes_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(0, Duration::from_millis(1));

        let _: Result<(), &str> = policy
            .run("zero", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("x")
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
