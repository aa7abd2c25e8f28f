/// Integration tests for resilience library
use resilience::{
    context::CallContext,
    retry::{with_retry, RetryConfig, Retryable},
    timeout::{with_timeout, TimeoutError},
};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
enum CallError {
    Timeout(TimeoutError),
    Rejected,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Timeout(e) => write!(f, "timeout: {}", e),
            CallError::Rejected => write!(f, "rejected"),
        }
    }
}

impl Retryable for CallError {
    fn is_retryable(&self) -> bool {
        matches!(self, CallError::Timeout(_))
    }
}

// ==================== Retry + Timeout Composition ====================

#[tokio::test(start_paused = true)]
async fn test_each_attempt_gets_a_fresh_window() {
    let ctx = CallContext::background();
    let config = RetryConfig::with_max_attempts(4);
    let counter = Arc::new(AtomicU32::new(0));

    let result = with_retry(&config, &ctx, || {
        let counter = counter.clone();
        let ctx = ctx.clone();
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            // First two attempts hang past the 50ms window
            let work = if attempt < 2 {
                Duration::from_millis(200)
            } else {
                Duration::from_millis(10)
            };
            with_timeout(&ctx, Duration::from_millis(50), tokio::time::sleep(work))
                .await
                .map_err(CallError::Timeout)
        }
    })
    .await;

    assert!(result.is_ok());
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_parent_deadline_stops_retry_loop() {
    let ctx = CallContext::with_timeout(Duration::from_millis(250));
    let config = RetryConfig::with_max_attempts(10);
    let counter = Arc::new(AtomicU32::new(0));

    let result = with_retry(&config, &ctx, || {
        let counter = counter.clone();
        let ctx = ctx.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            with_timeout(&ctx, Duration::from_secs(5), std::future::pending::<()>())
                .await
                .map_err(CallError::Timeout)
        }
    })
    .await;

    // First attempt consumes the whole parent deadline; the backoff sleep
    // then notices the context is done.
    assert!(matches!(
        result,
        Err(CallError::Timeout(TimeoutError::DeadlineExceeded))
    ));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_is_preserved() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let result = with_retry(
        &RetryConfig::with_max_attempts(4),
        &CallContext::background(),
        move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(CallError::Rejected) }
        },
    )
    .await;

    assert!(matches!(result, Err(CallError::Rejected)));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// ==================== Backoff Timing ====================

#[tokio::test]
async fn test_retry_quadratic_backoff_timing() {
    let config = RetryConfig {
        max_attempts: 4,
        min_backoff: Duration::from_millis(10),
        ..Default::default()
    };

    let start = std::time::Instant::now();

    let result = with_retry(&config, &CallContext::background(), || async {
        Err::<(), _>(CallError::Timeout(TimeoutError::Cancelled))
    })
    .await;

    let elapsed = start.elapsed();

    assert!(result.is_err());
    // Expected: 10ms + 40ms + 90ms = 140ms minimum
    assert!(elapsed >= Duration::from_millis(140));
}
