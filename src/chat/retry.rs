use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::time::{sleep, timeout};

use crate::errors::RetrieveError;

/// Maximum number of attempts per request
pub const MAX_RETRIES: u32 = 2;

/// Fixed pause between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Wall-clock bound for a single attempt
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a single attempt failed.
#[derive(Debug)]
pub enum AttemptError {
    Timeout,
    Connection(String),
    Upstream(String),
}

impl From<RetrieveError> for AttemptError {
    fn from(err: RetrieveError) -> Self {
        match err {
            RetrieveError::Timeout => AttemptError::Timeout,
            RetrieveError::Connection(msg) => AttemptError::Connection(msg),
            other => AttemptError::Upstream(other.to_string()),
        }
    }
}

/// Bounded retry with a per-attempt timeout and a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay: RETRY_DELAY,
            attempt_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds or attempts run out.
    ///
    /// An attempt that outlives `attempt_timeout` is dropped and counted as
    /// `AttemptError::Timeout`. When every attempt fails the last error wins.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, AttemptError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RetrieveError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match timeout(self.attempt_timeout, operation()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => AttemptError::from(err),
                Err(_) => AttemptError::Timeout,
            };
            warn!("Attempt {}/{} failed: {:?}", attempt, attempts, error);

            if attempt >= attempts {
                return Err(error);
            }
            attempt += 1;
            sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn every_attempt_timing_out_makes_two_attempts() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::pending()
            })
            .await;

        assert!(matches!(result, Err(AttemptError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= REQUEST_TIMEOUT * 2 + RETRY_DELAY);
        assert!(elapsed < REQUEST_TIMEOUT * 2 + RETRY_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_attempt_success_is_returned() {
        let calls = AtomicU32::new(0);

        let result = RetryPolicy::default()
            .run(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(RetrieveError::Connection("socket closed".to_string()))
                    } else {
                        Ok("answer")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn last_error_is_surfaced() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(RetrieveError::Timeout)
                    } else {
                        Err(RetrieveError::Connection("socket closed".to_string()))
                    }
                }
            })
            .await;

        assert!(matches!(result, Err(AttemptError::Connection(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_after_final_attempt() {
        let started = Instant::now();
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };

        let result: Result<(), _> = policy
            .run(|| async { Err(RetrieveError::Decode("bad json".to_string())) })
            .await;

        assert!(matches!(result, Err(AttemptError::Upstream(_))));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
