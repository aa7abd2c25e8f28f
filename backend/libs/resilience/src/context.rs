//! Call context: cancellation plus an optional absolute deadline
//!
//! A `CallContext` is the parent of every per-attempt timeout. Cancelling it
//! (or letting its deadline pass) aborts in-flight work and any pending
//! backoff sleep.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context whose deadline is `duration` from now
    pub fn with_timeout(duration: Duration) -> Self {
        Self::with_deadline(Instant::now() + duration)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Context cancelled whenever `parent` is cancelled
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            cancel: parent.child_token(),
            deadline: None,
        }
    }

    /// Tighten the deadline to at most `duration` from now
    pub fn and_timeout(mut self, duration: Duration) -> Self {
        let candidate = Instant::now() + duration;
        self.deadline = Some(match self.deadline {
            Some(current) if current < candidate => current,
            _ => candidate,
        });
        self
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once cancelled or past the deadline
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the context is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Sleep for `delay` unless the context ends first.
    ///
    /// Returns `true` if the full delay elapsed, `false` if the sleep was cut
    /// short by cancellation or by the deadline.
    pub async fn sleep(&self, delay: Duration) -> bool {
        let wake = Instant::now() + delay;
        let until = match self.deadline {
            Some(deadline) if deadline < wake => deadline,
            _ => wake,
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep_until(until) => until == wake,
        }
    }
}
