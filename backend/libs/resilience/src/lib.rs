//! Resilience primitives for outbound calls
//!
//! This library provides:
//! - **Call context**: cancellation token plus optional deadline, the parent
//!   of every per-attempt timeout
//! - **Timeout**: a fresh time window per attempt, nested in the context
//! - **Retry**: capped quadratic backoff over errors tagged [`Retryable`]
//!
//! # Example
//!
//! ```rust,no_run
//! use resilience::{with_retry, CallContext, RetryConfig, Retryable};
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("flaky")
//!     }
//! }
//!
//! impl Retryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = CallContext::background();
//!     let result = with_retry(&RetryConfig::with_max_attempts(3), &ctx, || async {
//!         Err::<(), _>(Flaky)
//!     })
//!     .await;
//!     assert!(result.is_err());
//! }
//! ```

pub mod context;
pub mod retry;
pub mod timeout;

pub use context::CallContext;
pub use retry::{with_retry, RetryConfig, Retryable};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
