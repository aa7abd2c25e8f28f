use resilience::{Retryable, TimeoutError};
use thiserror::Error;

/// FCM Client Error Types
#[derive(Error, Debug)]
pub enum FCMError {
    #[error("Message is invalid")]
    InvalidMessage,

    #[error("Message target is invalid: {0}")]
    InvalidTarget(String),

    #[error("Too many registration ids: {0} (max 1000)")]
    TooManyRegistrationIds(usize),

    #[error("Message time-to-live is invalid: {0}s (max 2419200s)")]
    InvalidTimeToLive(u32),

    #[error("Client API key is invalid")]
    InvalidApiKey,

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Failed to serialize message: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("FCM connection error: {0}")]
    Connection(String),

    #[error("{status} error: {reason}")]
    Server { status: u16, reason: String },

    #[error("{status} error: {reason}")]
    Http { status: u16, reason: String },

    #[error("Failed to parse FCM response: {0}")]
    Decode(String),

    #[error("Failed to get access token: {0}")]
    Token(String),
}

impl FCMError {
    /// Only connection-class and 5xx failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, FCMError::Connection(_) | FCMError::Server { .. })
    }

    /// True for errors raised before any network activity
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FCMError::InvalidMessage
                | FCMError::InvalidTarget(_)
                | FCMError::TooManyRegistrationIds(_)
                | FCMError::InvalidTimeToLive(_)
        )
    }
}

impl Retryable for FCMError {
    fn is_retryable(&self) -> bool {
        FCMError::is_retryable(self)
    }
}

impl From<TimeoutError> for FCMError {
    fn from(err: TimeoutError) -> Self {
        FCMError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FCMError::Connection("refused".into()).is_retryable());
        assert!(FCMError::Server {
            status: 503,
            reason: "Service Unavailable".into()
        }
        .is_retryable());

        assert!(!FCMError::Http {
            status: 400,
            reason: "Bad Request".into()
        }
        .is_retryable());
        assert!(!FCMError::Decode("bad json".into()).is_retryable());
        assert!(!FCMError::InvalidTarget("none".into()).is_retryable());
    }

    #[test]
    fn test_timeout_maps_to_connection_error() {
        let err: FCMError = TimeoutError::Cancelled.into();
        assert!(matches!(err, FCMError::Connection(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_error_display() {
        let err = FCMError::Http {
            status: 401,
            reason: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "401 error: Unauthorized");
    }
}
