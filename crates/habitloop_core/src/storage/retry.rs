//! Bounded retry with exponential backoff and per-attempt timeout.
//!
//! # Responsibility
//! - Wrap one async operation in an attempt budget and time limits.
//!
//! # Invariants
//! - The policy wraps each remote call individually, never a combination of
//!   calls as one unit.
//! - A timed-out attempt counts against the budget like any other failure.
//! - A timeout cancels only the current attempt, not the overall operation.

use log::warn;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::error::Elapsed;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF_MS: u64 = 250;
const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 1500;

/// Attempt budget and timing for one wrapped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. At least 1.
    pub attempts: u32,
    /// Backoff before retry `i` is `base_backoff * 2^(i-1)`.
    pub base_backoff: Duration,
    /// Hard time limit applied to every single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    /// Returns the error of the final attempt; a timeout is converted into
    /// the caller's error type via `From<Elapsed>`.
    pub async fn run<T, E, F, Fut>(&self, op: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + From<Elapsed>,
    {
        let attempts = self.attempts.max(1);
        let mut last_error: Option<E> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.backoff_delay(attempt)).await;
            }

            let outcome = tokio::time::timeout(self.attempt_timeout, operation()).await;
            let error = match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(elapsed) => E::from(elapsed),
            };

            warn!(
                "event=retry_attempt module=storage status=failed op={op} attempt={}/{attempts} error={error}",
                attempt + 1
            );
            last_error = Some(error);
        }

        // last_error is always set: attempts >= 1 and every failed attempt
        // stores its error before the loop continues.
        match last_error {
            Some(error) => Err(error),
            None => unreachable!("retry loop runs at least one attempt"),
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt - 1)
    }
}
