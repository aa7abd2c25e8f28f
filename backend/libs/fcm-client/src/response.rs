use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::errors::FCMError;

/// Per-recipient error reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingRegistration,
    InvalidRegistration,
    NotRegistered,
    InvalidPackageName,
    MismatchSenderId,
    InvalidParameters,
    MessageTooBig,
    InvalidDataKey,
    InvalidTtl,
    Unavailable,
    InternalServerError,
    DeviceMessageRateExceeded,
    TopicsMessageRateExceeded,
    InvalidApnsCredential,
    AuthenticationError,
    /// Any code not in the table; new gateway codes land here
    Unknown,
}

/// Gateway error codes. Add a row to support a new code.
const ERROR_CODES: &[(&str, ErrorKind)] = &[
    ("MissingRegistration", ErrorKind::MissingRegistration),
    ("InvalidRegistration", ErrorKind::InvalidRegistration),
    ("NotRegistered", ErrorKind::NotRegistered),
    ("InvalidPackageName", ErrorKind::InvalidPackageName),
    ("MismatchSenderId", ErrorKind::MismatchSenderId),
    ("InvalidParameters", ErrorKind::InvalidParameters),
    ("MessageTooBig", ErrorKind::MessageTooBig),
    ("InvalidDataKey", ErrorKind::InvalidDataKey),
    ("InvalidTtl", ErrorKind::InvalidTtl),
    ("Unavailable", ErrorKind::Unavailable),
    ("InternalServerError", ErrorKind::InternalServerError),
    ("DeviceMessageRateExceeded", ErrorKind::DeviceMessageRateExceeded),
    ("TopicsMessageRateExceeded", ErrorKind::TopicsMessageRateExceeded),
    ("InvalidApnsCredential", ErrorKind::InvalidApnsCredential),
    ("AuthenticationError", ErrorKind::AuthenticationError),
];

impl ErrorKind {
    pub fn from_code(code: &str) -> Self {
        ERROR_CODES
            .iter()
            .find(|(name, _)| *name == code)
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    pub fn code(&self) -> &'static str {
        ERROR_CODES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("Unknown")
    }

    /// The recipient id should be dropped by the sender
    pub fn is_unregistered(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotRegistered | ErrorKind::InvalidRegistration | ErrorKind::InvalidParameters
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Empty or absent strings mean "no error"
fn deserialize_error_kind<'de, D>(deserializer: D) -> Result<Option<ErrorKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<String>::deserialize(deserializer)?;
    Ok(code
        .filter(|c| !c.is_empty())
        .map(|c| ErrorKind::from_code(&c)))
}

fn deserialize_non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

/// `null` decodes like an absent field
fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Outcome for one recipient
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResult {
    #[serde(default, deserialize_with = "deserialize_non_empty", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Canonical id the sender should use from now on
    #[serde(default, deserialize_with = "deserialize_non_empty", skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_error_kind", skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl MessageResult {
    pub fn unregistered(&self) -> bool {
        self.error.is_some_and(|e| e.is_unregistered())
    }
}

/// Decoded gateway reply.
///
/// Multicast replies fill the counters and `results`; topic replies fill the
/// top-level `message_id` / `error`; device-group replies fill the counters
/// and `failed_registration_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicast_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_or_default", rename = "success")]
    pub success_count: u32,
    #[serde(default, deserialize_with = "deserialize_or_default", rename = "failure")]
    pub failure_count: u32,
    #[serde(default, deserialize_with = "deserialize_or_default", rename = "canonical_ids")]
    pub canonical_id_count: u32,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub results: Vec<MessageResult>,
    /// Reported by device-group sends; extended by the client with
    /// unregistered multicast recipients
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub failed_registration_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_error_kind", skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl Response {
    pub fn decode(bytes: &[u8]) -> Result<Self, FCMError> {
        serde_json::from_slice(bytes).map_err(|e| FCMError::Decode(e.to_string()))
    }

    /// Pairs of (sent id, canonical id) for results that carry a replacement.
    ///
    /// `registration_ids` must be the list the message was sent to.
    pub fn canonical_replacements<'a>(
        &'a self,
        registration_ids: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.results
            .iter()
            .zip(registration_ids)
            .filter_map(|(result, sent)| {
                result
                    .registration_id
                    .as_deref()
                    .map(|canonical| (sent.as_str(), canonical))
            })
    }
}
