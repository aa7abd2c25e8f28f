//! FCM Client Library
//!
//! Sends push notifications to the Firebase Cloud Messaging HTTP gateway and
//! decodes per-recipient outcomes.
//!
//! It handles:
//! - Message validation against gateway limits (targets, registration id
//!   count, time-to-live, topic conditions)
//! - One-shot and retrying sends with per-attempt timeouts
//! - API-key (legacy) and bearer-token authorization
//! - Mapping gateway error codes onto [`ErrorKind`]
//! - Collecting unregistered recipients of multicast sends
//!
//! # Example
//!
//! ```rust,no_run
//! use fcm_client::{ClientConfig, FCMClient, Message, Notification};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fcm_client::FCMError> {
//!     let client = FCMClient::new(ClientConfig::legacy("sample_api_key")?)?;
//!
//!     let msg = Message::to_token("sample_device_token")
//!         .with_data("foo", "bar")
//!         .with_notification(Notification::new("title", "body"));
//!
//!     let response = client.send_with_retry(&msg, 3).await?;
//!     println!("success={} failure={}", response.success_count, response.failure_count);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod message;
pub mod response;
pub mod transport;

pub use client::FCMClient;
pub use config::{ClientConfig, Credentials, StaticTokenSource, TokenSource, DEFAULT_ENDPOINT};
pub use errors::FCMError;
pub use message::{Message, Notification, Priority};
pub use resilience::CallContext;
pub use response::{ErrorKind, MessageResult, Response};
pub use transport::{BearerTransport, LegacyTransport, Transport};
