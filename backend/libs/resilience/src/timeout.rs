//! Per-attempt timeout bounded by a parent call context

use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::context::CallContext;

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
    #[error("Context deadline exceeded")]
    DeadlineExceeded,
    #[error("Operation cancelled")]
    Cancelled,
}

/// Run `future` with a fresh `duration` window, nested inside `ctx`.
///
/// Whichever ends first wins: the window, the context deadline, or a
/// cancellation of the context.
pub async fn with_timeout<F, T>(
    ctx: &CallContext,
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    if ctx.is_cancelled() {
        return Err(TimeoutError::Cancelled);
    }

    let window = Instant::now() + duration;
    let (deadline, parent_bound) = match ctx.deadline() {
        Some(parent) if parent < window => (parent, true),
        _ => (window, false),
    };

    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(TimeoutError::Cancelled),
        result = timeout_at(deadline, future) => result.map_err(|_| {
            if parent_bound {
                TimeoutError::DeadlineExceeded
            } else {
                TimeoutError::Elapsed(duration)
            }
        }),
    }
}
