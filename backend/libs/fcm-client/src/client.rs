use resilience::{with_retry, CallContext, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{ClientConfig, Credentials};
use crate::errors::FCMError;
use crate::message::Message;
use crate::response::Response;
use crate::transport::{BearerTransport, LegacyTransport, Transport};

/// Firebase Cloud Messaging Client
///
/// Validates and serializes messages, sends them through the configured
/// transport and reconciles unregistered recipients. Configuration is
/// immutable after construction, so one client can be shared freely.
#[derive(Clone)]
pub struct FCMClient {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    max_condition_topics: usize,
    retry_config: RetryConfig,
}

impl FCMClient {
    /// Create new FCM client
    ///
    /// The transport is chosen by the credentials: an API key selects the
    /// legacy protocol, a token source selects bearer authorization.
    pub fn new(config: ClientConfig) -> Result<Self, FCMError> {
        let http_client = config.build_http_client()?;

        let transport: Arc<dyn Transport> = match &config.credentials {
            Credentials::ApiKey(key) => Arc::new(LegacyTransport::new(
                http_client,
                config.endpoint.clone(),
                key.clone(),
            )),
            Credentials::Bearer(tokens) => Arc::new(BearerTransport::new(
                http_client,
                config.endpoint.clone(),
                tokens.clone(),
            )),
        };

        info!(
            "Initialized FCM client for endpoint={}, timeout={:?}",
            config.endpoint, config.timeout
        );

        Ok(Self::with_transport(transport, &config))
    }

    /// Create a client over a caller-provided transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout,
            max_condition_topics: config.max_condition_topics,
            retry_config: RetryConfig::default(),
        }
    }

    /// Replace the backoff schedule used by the retrying sends.
    /// The attempt budget still comes from each call.
    pub fn with_backoff(mut self, min_backoff: Duration, max_backoff: Duration) -> Self {
        self.retry_config.min_backoff = min_backoff;
        self.retry_config.max_backoff = max_backoff;
        self
    }

    /// Send once, without retrying
    pub async fn send(&self, msg: &Message) -> Result<Response, FCMError> {
        self.send_with_context(&CallContext::background(), msg).await
    }

    /// Send, retrying transient failures up to `max_attempts` calls in total
    pub async fn send_with_retry(
        &self,
        msg: &Message,
        max_attempts: u32,
    ) -> Result<Response, FCMError> {
        self.send_with_retry_with_context(&CallContext::background(), msg, max_attempts)
            .await
    }

    /// Send once; `ctx` can cancel the call or impose an earlier deadline
    pub async fn send_with_context(
        &self,
        ctx: &CallContext,
        msg: &Message,
    ) -> Result<Response, FCMError> {
        let body = self.prepare(msg)?;
        let response = self.transport.send_once(ctx, &body, self.timeout).await?;
        Ok(reconcile(msg, response))
    }

    /// Retrying send under `ctx`. Every attempt gets a fresh timeout
    /// window; cancelling `ctx` also interrupts the backoff sleep.
    pub async fn send_with_retry_with_context(
        &self,
        ctx: &CallContext,
        msg: &Message,
        max_attempts: u32,
    ) -> Result<Response, FCMError> {
        let body = self.prepare(msg)?;
        let config = RetryConfig {
            max_attempts,
            ..self.retry_config.clone()
        };

        let response = with_retry(&config, ctx, || {
            self.transport.send_once(ctx, &body, self.timeout)
        })
        .await?;

        Ok(reconcile(msg, response))
    }

    fn prepare(&self, msg: &Message) -> Result<Vec<u8>, FCMError> {
        msg.validate_with(self.max_condition_topics)?;
        let body = serde_json::to_vec(msg).map_err(FCMError::Serialization)?;

        debug!(
            "Sending FCM message to {} ({} bytes)",
            describe_target(msg),
            body.len()
        );
        Ok(body)
    }
}

/// Append unregistered multicast recipients to `failed_registration_ids`.
///
/// Results are index-aligned with `registration_ids`, so this only applies
/// to multicast sends.
fn reconcile(msg: &Message, mut response: Response) -> Response {
    if response.failure_count == 0 || msg.registration_ids.is_empty() {
        return response;
    }

    let unregistered: Vec<String> = response
        .results
        .iter()
        .zip(&msg.registration_ids)
        .filter(|(result, _)| result.unregistered())
        .map(|(_, id)| id.clone())
        .collect();

    info!(
        "FCM reported {} failure(s), {} unregistered recipient(s)",
        response.failure_count,
        unregistered.len()
    );

    response.failed_registration_ids.extend(unregistered);
    response
}

fn describe_target(msg: &Message) -> String {
    if !msg.registration_ids.is_empty() {
        return format!("{} registration ids", msg.registration_ids.len());
    }
    if let Some(to) = msg.to.as_deref() {
        if msg.is_topic() {
            return to.to_string();
        }
        let prefix = to.chars().take(8).collect::<String>();
        return format!("token {}...", prefix);
    }
    "condition".to_string()
}
