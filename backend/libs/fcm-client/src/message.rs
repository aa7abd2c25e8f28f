use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::FCMError;

/// Maximum number of registration ids in one multicast send
pub const MAX_REGISTRATION_IDS: usize = 1000;

/// Maximum time-to-live in seconds (28 days)
pub const MAX_TIME_TO_LIVE: u32 = 2_419_200;

/// Default limit on `'<topic>' in topics` terms in a condition
pub const DEFAULT_MAX_CONDITION_TOPICS: usize = 5;

const TOPIC_PREFIX: &str = "/topics/";

/// Delivery priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

/// Push message: one target, delivery options and payload.
///
/// Optional fields left unset are omitted from the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Device token or `/topics/<name>`
    #[serde(skip_serializing_if = "is_blank")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registration_ids: Vec<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub content_available: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delay_while_idle: bool,
    /// Seconds; `Some(0)` is sent as-is and means "now or never"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delivery_receipt_requested: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,
}

/// User-visible notification payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_loc_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_loc_args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_args: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Default::default()
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_blank(value: &Option<String>) -> bool {
    non_empty(value.as_deref()).is_none()
}

impl Message {
    /// Message addressed to a single device token
    pub fn to_token(token: impl Into<String>) -> Self {
        Self {
            to: Some(token.into()),
            ..Default::default()
        }
    }

    /// Message broadcast to a topic
    pub fn to_topic(topic: &str) -> Self {
        Self {
            to: Some(format!("{TOPIC_PREFIX}{topic}")),
            ..Default::default()
        }
    }

    /// Multicast message; results come back index-aligned with `ids`
    pub fn to_registration_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registration_ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Message addressed by a boolean topic condition,
    /// e.g. `'dogs' in topics || 'cats' in topics`
    pub fn to_condition(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            ..Default::default()
        }
    }

    pub fn with_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_time_to_live(mut self, seconds: u32) -> Self {
        self.time_to_live = Some(seconds);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_collapse_key(mut self, key: impl Into<String>) -> Self {
        self.collapse_key = Some(key.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// True when `to` names a topic rather than a device token
    pub fn is_topic(&self) -> bool {
        self.to
            .as_deref()
            .is_some_and(|to| to.starts_with(TOPIC_PREFIX))
    }

    /// Validate with the default condition topic limit
    pub fn validate(&self) -> Result<(), FCMError> {
        self.validate_with(DEFAULT_MAX_CONDITION_TOPICS)
    }

    /// Validate against gateway constraints.
    ///
    /// Checks run in order: target present, registration id count,
    /// topic/condition well-formedness, time-to-live.
    pub fn validate_with(&self, max_condition_topics: usize) -> Result<(), FCMError> {
        let to = non_empty(self.to.as_deref());
        let condition = non_empty(self.condition.as_deref());

        if to.is_none() && self.registration_ids.is_empty() && condition.is_none() {
            return Err(FCMError::InvalidTarget("no target set".to_string()));
        }

        if self.registration_ids.len() > MAX_REGISTRATION_IDS {
            return Err(FCMError::TooManyRegistrationIds(self.registration_ids.len()));
        }

        if let Some(topic) = to.and_then(|to| to.strip_prefix(TOPIC_PREFIX)) {
            if topic.trim().is_empty() {
                return Err(FCMError::InvalidTarget("empty topic name".to_string()));
            }
        }

        if let Some(condition) = condition {
            check_condition(condition, max_condition_topics)?;
        }

        match self.time_to_live {
            Some(ttl) if ttl > MAX_TIME_TO_LIVE => Err(FCMError::InvalidTimeToLive(ttl)),
            _ => Ok(()),
        }
    }
}

/// Validate a message that may be absent
pub fn validate(message: Option<&Message>) -> Result<(), FCMError> {
    message.ok_or(FCMError::InvalidMessage)?.validate()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_condition(condition: &str, max_topics: usize) -> Result<(), FCMError> {
    let mut depth: i32 = 0;
    for c in condition.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(FCMError::InvalidTarget(
                        "unbalanced parentheses in condition".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(FCMError::InvalidTarget(
            "unbalanced parentheses in condition".to_string(),
        ));
    }

    let topics = count_topic_terms(condition);
    if topics == 0 {
        return Err(FCMError::InvalidTarget(
            "condition references no topics".to_string(),
        ));
    }
    if topics > max_topics {
        return Err(FCMError::InvalidTarget(format!(
            "condition has {} topics (max {})",
            topics, max_topics
        )));
    }

    Ok(())
}

/// Number of `<topic> in topics` terms, whatever whitespace separates them
fn count_topic_terms(condition: &str) -> usize {
    let tokens: Vec<&str> = condition.split_whitespace().collect();
    tokens
        .windows(2)
        .filter(|pair| {
            let is_in = pair[0] == "in" || pair[0].ends_with("'in") || pair[0].ends_with("\"in");
            let is_topics = pair[1]
                .strip_prefix("topics")
                .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'));
            is_in && is_topics
        })
        .count()
}
