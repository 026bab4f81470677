use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

/// Bounded retries with linear backoff (`backoff * attempt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Run `action` until it succeeds, fails with an error `should_retry`
    /// rejects, or the retry budget is spent.
    ///
    /// On failure returns the last error and the number of attempts made.
    pub async fn run<F, Fut, T, E>(
        &self,
        op: &str,
        mut action: F,
        should_retry: impl Fn(&E) -> bool,
    ) -> Result<T, (E, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match action().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.max_retries || !should_retry(&err) {
                        error!(op, attempts = attempt, error = %err, "giving up");
                        return Err((err, attempt));
                    }
                    let backoff = self.backoff * attempt;
                    warn!(op, attempt, error = %err, ?backoff, "retrying");
                    sleep(backoff).await;
                }
            }
        }
    }
}
