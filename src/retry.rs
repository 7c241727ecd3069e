//! Bounded retry helper shared by the snapshot acquirer and the delivery client.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Fixed-delay retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

/// The last error of a retry loop that never succeeded.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Attempts actually made.
    pub attempts: u32,
    /// Error of the final attempt.
    pub last: E,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Effective attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Run `op` until it returns `Ok` or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. A cancelled token stops the
    /// loop during the inter-attempt delay; an in-flight attempt is never
    /// interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] with the last attempt's error when no attempt
    /// succeeds, or when cancellation cuts the budget short.
    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        mut op: F,
    ) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!(attempt, max_attempts, error = %e, "Attempt failed");
                    if attempt >= max_attempts || !self.pause(cancel).await {
                        return Err(Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Sleep for the retry delay. Returns `false` if cancelled first.
    async fn pause(&self, cancel: Option<&CancellationToken>) -> bool {
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;

                    () = token.cancelled() => false,
                    () = tokio::time::sleep(self.delay) => true,
                }
            }
            None => {
                tokio::time::sleep(self.delay).await;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(1));

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Exhausted<String>> = FAST
            .run(None, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(attempt) }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let result: Result<u32, Exhausted<String>> = FAST
            .run(None, |attempt| async move {
                if attempt < 3 {
                    Err(format!("attempt {attempt} locked"))
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Exhausted<String>> = FAST
            .run(None, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {attempt}")) }
            })
            .await;
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last, "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        assert_eq!(policy.max_attempts(), 1);
        let result: Result<(), Exhausted<&str>> = policy.run(None, |_| async { Err("no") }).await;
        assert_eq!(result.unwrap_err().attempts, 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_attempts() {
        let token = CancellationToken::new();
        token.cancel();
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let result: Result<(), Exhausted<&str>> =
            policy.run(Some(&token), |_| async { Err("busy") }).await;
        assert_eq!(result.unwrap_err().attempts, 1);
    }
}
