//! Retry with exponential backoff for remote backend calls.
//!
//! [`RetryPolicy`] is a pure control-flow wrapper: it bounds attempt count,
//! never wall-clock time. A caller needing an overall deadline composes a
//! timeout around the whole `execute` call.

use crate::defaults;
use crate::error::{Result, VoxbridgeError};
use std::future::Future;
use std::time::Duration;

/// Retry/backoff executor for any fallible async operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; `execute` tries at most
    /// `max_retries + 1` times total.
    max_retries: u32,
    /// Delay before the first retry.
    base_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            base_delay: defaults::BASE_DELAY,
            backoff_multiplier: defaults::BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff_multiplier,
        }
    }

    /// Policy that gives every operation exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO, 1.0)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the given retry (1-indexed): `base * multiplier^(n-1)`.
    ///
    /// No jitter; the schedule is deterministic.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64((self.base_delay.as_secs_f64() * factor).max(0.0))
    }

    /// Runs `operation` until it succeeds, `should_retry` declines, or the
    /// attempt budget runs out.
    ///
    /// On exhaustion the error from the final attempt propagates unchanged;
    /// there is no synthetic "retries exhausted" wrapper hiding the root
    /// cause.
    pub async fn execute<T, F, Fut, P>(&self, mut operation: F, should_retry: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&VoxbridgeError) -> bool,
    {
        let mut failed_attempts = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    failed_attempts += 1;
                    if failed_attempts > self.max_retries || !should_retry(&error) {
                        return Err(error);
                    }
                    let delay = self.delay_before_retry(failed_attempts);
                    tracing::warn!(
                        attempt = failed_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "backend call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// `execute` with the standard transient-error predicate.
    pub async fn execute_transient<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute(operation, VoxbridgeError::is_transient).await
    }
}
