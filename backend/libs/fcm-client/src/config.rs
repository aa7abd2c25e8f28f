//! FCM client configuration
//!
//! A `ClientConfig` starts from credentials and is refined by `with_*`
//! options, each validated on the spot. The finished value is frozen inside
//! the client at construction.

use async_trait::async_trait;
use resilience::TimeoutConfig;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::errors::FCMError;
use crate::message::DEFAULT_MAX_CONDITION_TOPICS;

/// Legacy HTTP endpoint of the FCM service
pub const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// Supplies bearer tokens for the token-authenticated transport
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, FCMError>;
}

/// A fixed, externally minted access token
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, FCMError> {
        Ok(self.token.clone())
    }
}

/// How requests are authorized
#[derive(Clone)]
pub enum Credentials {
    /// `Authorization: key=<api key>`
    ApiKey(String),
    /// `Authorization: Bearer <token>`
    Bearer(Arc<dyn TokenSource>),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::Bearer(_) => f.write_str("Bearer(<token source>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) credentials: Credentials,
    pub(crate) endpoint: Url,
    pub(crate) timeout: Duration,
    pub(crate) proxy: Option<reqwest::Proxy>,
    pub(crate) http_client: Option<reqwest::Client>,
    pub(crate) max_condition_topics: usize,
}

/// Variables read by [`ClientConfig::from_env`], all prefixed with `FCM_`
#[derive(Debug, Default, Deserialize)]
struct EnvConfig {
    api_key: Option<String>,
    bearer_token: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    proxy_url: Option<String>,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Result<Self, FCMError> {
        if let Credentials::ApiKey(key) = &credentials {
            if key.trim().is_empty() {
                return Err(FCMError::InvalidApiKey);
            }
        }

        Ok(Self {
            credentials,
            endpoint: Url::parse(DEFAULT_ENDPOINT).map_err(|e| FCMError::Config(e.to_string()))?,
            timeout: TimeoutConfig::default().duration,
            proxy: None,
            http_client: None,
            max_condition_topics: DEFAULT_MAX_CONDITION_TOPICS,
        })
    }

    /// Legacy mode: authorize with a server API key
    pub fn legacy(api_key: impl Into<String>) -> Result<Self, FCMError> {
        Self::new(Credentials::ApiKey(api_key.into()))
    }

    /// Token mode: authorize with bearer tokens from `source`
    pub fn bearer(source: impl TokenSource + 'static) -> Result<Self, FCMError> {
        Self::new(Credentials::Bearer(Arc::new(source)))
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, FCMError> {
        if endpoint.trim().is_empty() {
            return Err(FCMError::Config("endpoint must not be empty".to_string()));
        }
        let url = Url::parse(endpoint)
            .map_err(|e| FCMError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FCMError::Config(format!(
                "endpoint must be http(s), got '{}'",
                url.scheme()
            )));
        }
        self.endpoint = url;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, FCMError> {
        if timeout.is_zero() {
            return Err(FCMError::Config("invalid timeout duration".to_string()));
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Route requests through an HTTP proxy. Not combinable with
    /// [`with_http_client`](Self::with_http_client).
    pub fn with_proxy(mut self, proxy_url: &str) -> Result<Self, FCMError> {
        if self.http_client.is_some() {
            return Err(FCMError::Config(
                "proxy cannot be set on a caller-supplied http client".to_string(),
            ));
        }
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| FCMError::Config(format!("invalid proxy '{}': {}", proxy_url, e)))?;
        self.proxy = Some(proxy);
        Ok(self)
    }

    /// Use a caller-supplied connection pool
    pub fn with_http_client(mut self, client: reqwest::Client) -> Result<Self, FCMError> {
        if self.proxy.is_some() {
            return Err(FCMError::Config(
                "proxy cannot be set on a caller-supplied http client".to_string(),
            ));
        }
        self.http_client = Some(client);
        Ok(self)
    }

    pub fn with_max_condition_topics(mut self, max: usize) -> Result<Self, FCMError> {
        if max == 0 {
            return Err(FCMError::Config(
                "condition topic limit must be at least 1".to_string(),
            ));
        }
        self.max_condition_topics = max;
        Ok(self)
    }

    /// Build from `FCM_API_KEY` or `FCM_BEARER_TOKEN`, plus optional
    /// `FCM_ENDPOINT`, `FCM_TIMEOUT_SECS` and `FCM_PROXY_URL`.
    pub fn from_env() -> Result<Self, FCMError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, FCMError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed("FCM_")
            .from_iter(vars)
            .map_err(|e| FCMError::Config(e.to_string()))?;

        let mut config = match (env.api_key, env.bearer_token) {
            (Some(key), None) => Self::legacy(key)?,
            (None, Some(token)) => Self::bearer(StaticTokenSource::new(token))?,
            (Some(_), Some(_)) => {
                return Err(FCMError::Config(
                    "set only one of FCM_API_KEY and FCM_BEARER_TOKEN".to_string(),
                ))
            }
            (None, None) => {
                return Err(FCMError::Config(
                    "FCM_API_KEY or FCM_BEARER_TOKEN is required".to_string(),
                ))
            }
        };

        if let Some(endpoint) = env.endpoint {
            config = config.with_endpoint(&endpoint)?;
        }
        if let Some(secs) = env.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        if let Some(proxy) = env.proxy_url {
            config = config.with_proxy(&proxy)?;
        }

        Ok(config)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_condition_topics(&self) -> usize {
        self.max_condition_topics
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The shared connection pool used by every request
    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, FCMError> {
        if let Some(client) = &self.http_client {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy.clone());
        }
        builder
            .build()
            .map_err(|e| FCMError::Config(format!("failed to build http client: {}", e)))
    }
}
