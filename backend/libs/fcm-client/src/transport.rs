//! One HTTP round-trip to the gateway
//!
//! Two transports share the request/classification code and differ only in
//! how they authorize: `LegacyTransport` sends `Authorization: key=…`,
//! `BearerTransport` sends `Authorization: Bearer …`.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use resilience::{with_timeout, CallContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::TokenSource;
use crate::errors::FCMError;
use crate::response::Response;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one request with a serialized message body.
    ///
    /// The call is bounded by a fresh `timeout` window nested in `ctx`.
    async fn send_once(
        &self,
        ctx: &CallContext,
        body: &[u8],
        timeout: Duration,
    ) -> Result<Response, FCMError>;
}

/// API-key authorized transport
pub struct LegacyTransport {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl LegacyTransport {
    pub fn new(http_client: reqwest::Client, endpoint: Url, api_key: String) -> Self {
        Self {
            http_client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Transport for LegacyTransport {
    async fn send_once(
        &self,
        ctx: &CallContext,
        body: &[u8],
        timeout: Duration,
    ) -> Result<Response, FCMError> {
        let request = self
            .http_client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("key={}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec());

        execute(ctx, request, timeout).await
    }
}

/// Token authorized transport
pub struct BearerTransport {
    http_client: reqwest::Client,
    endpoint: Url,
    tokens: Arc<dyn TokenSource>,
}

impl BearerTransport {
    pub fn new(http_client: reqwest::Client, endpoint: Url, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http_client,
            endpoint,
            tokens,
        }
    }
}

#[async_trait]
impl Transport for BearerTransport {
    async fn send_once(
        &self,
        ctx: &CallContext,
        body: &[u8],
        timeout: Duration,
    ) -> Result<Response, FCMError> {
        // Token fetch and request share one window
        let ctx = ctx.clone().and_timeout(timeout);
        let access_token = with_timeout(&ctx, timeout, self.tokens.access_token()).await??;

        let request = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec());

        execute(&ctx, request, timeout).await
    }
}

async fn execute(
    ctx: &CallContext,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Response, FCMError> {
    let call = async {
        let response = request
            .send()
            .await
            .map_err(|e| FCMError::Connection(e.to_string()))?;

        let status = response.status();
        debug!("FCM responded with status {}", status);

        if status != StatusCode::OK {
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            if status.is_server_error() {
                return Err(FCMError::Server {
                    status: status.as_u16(),
                    reason,
                });
            }
            return Err(FCMError::Http {
                status: status.as_u16(),
                reason,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FCMError::Connection(e.to_string()))?;

        Response::decode(&bytes).map_err(|e| {
            error!("Failed to decode FCM response: {}", e);
            e
        })
    };

    with_timeout(ctx, timeout, call).await?
}
