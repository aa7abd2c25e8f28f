//! Retry policy with capped quadratic backoff
//!
//! The n-th consecutive failure (1-based) waits `min_backoff * n²` before the
//! next call. The loop ends on success, on a non-retryable error, once the
//! attempt budget is spent, or when the computed delay would exceed
//! `max_backoff`. The error from the last call is returned unchanged.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::context::CallContext;

/// Errors that carry an explicit retryable tag.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of calls, including the first one (0 behaves like 1)
    pub max_attempts: u32,
    /// Backoff unit
    pub min_backoff: Duration,
    /// A computed delay above this ends the loop
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Delay scheduled after the `failures`-th consecutive failure
    pub fn backoff_for(&self, failures: u32) -> Duration {
        self.min_backoff.saturating_mul(failures.saturating_mul(failures))
    }
}

/// Execute a fallible future with retry logic.
///
/// `ctx` bounds the whole loop: a cancelled or expired context stops any
/// pending backoff sleep and returns the last error.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    ctx: &CallContext,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut failures: u32 = 0;

    loop {
        let err = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_retryable() {
            debug!("Non-retryable error, giving up: {}", err);
            return Err(err);
        }

        failures += 1;
        let delay = config.backoff_for(failures);

        if failures >= max_attempts || delay > config.max_backoff {
            warn!(
                "Giving up after {} attempt(s) (budget {}): {}",
                failures, max_attempts, err
            );
            return Err(err);
        }

        warn!(
            "Retry attempt {}/{} after error: {}, waiting {:?}",
            failures, max_attempts, err, delay
        );

        if !ctx.sleep(delay).await {
            warn!("Retry aborted during backoff: context is done");
            return Err(err);
        }
    }
}
