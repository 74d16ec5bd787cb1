use std::fmt;

use serde_json::{Map, Value};

use crate::notification::Notification;

/// Who receives the message.
///
/// The order of a `Multiple` list is what ties each entry of the gateway's
/// `results` array back to a registration id, so it must not be reordered
/// between sending and reading the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// One registration token, or a topic. Sent as `to`.
    Single(String),
    /// Registration tokens for a multicast message. Sent as `registration_ids`.
    Multiple(Vec<String>),
}

impl Recipients {
    /// Addresses every device subscribed to `topic`.
    pub fn topic(topic: &str) -> Recipients {
        Recipients::Single(format!("/topics/{}", topic))
    }

    pub fn len(&self) -> usize {
        match self {
            Recipients::Single(_) => 1,
            Recipients::Multiple(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Recipients {
    fn from(recipient: String) -> Self {
        Recipients::Single(recipient)
    }
}

impl From<&str> for Recipients {
    fn from(recipient: &str) -> Self {
        Recipients::Single(recipient.to_string())
    }
}

impl From<Vec<String>> for Recipients {
    fn from(recipients: Vec<String>) -> Self {
        Recipients::Multiple(recipients)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(recipients: Vec<&str>) -> Self {
        Recipients::Multiple(recipients.into_iter().map(String::from).collect())
    }
}

/// Delivery priority of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

/// Everything needed to send a push message through the gateway.
///
/// Only the fields that are `Some` end up in the request.
#[derive(Debug, Clone, PartialEq)]
pub struct GcmMessage {
    /// The registration token(s) or topic to send to.
    pub recipients: Recipients,
    /// Messages with the same key replace each other while waiting for
    /// delivery.
    pub collapse_key: Option<String>,
    /// Custom key-value payload handed to the application. At most 4096 bytes
    /// once serialized.
    pub data: Option<Map<String, Value>>,
    /// Display notification. At most 2048 bytes once serialized.
    pub notification: Option<Notification>,
    /// Wait until the device is active before delivering.
    pub delay_while_idle: Option<bool>,
    /// How long, in seconds, the gateway keeps the message when the device is
    /// offline.
    pub time_to_live: Option<u32>,
    /// Only deliver to registration tokens of this application package.
    pub restricted_package_name: Option<String>,
    /// Let the gateway validate the message without delivering it.
    pub dry_run: Option<bool>,
    /// Wake an inactive client app (iOS).
    pub content_available: Option<bool>,
    pub priority: Option<Priority>,
}

/// The main type for composing a message.
#[derive(Debug, Clone)]
pub struct GcmMessageBuilder {
    message: GcmMessage,
}

impl GcmMessageBuilder {
    /// Creates a builder for a message to the given recipient(s). Nothing is
    /// validated until the message is sent.
    pub fn new<R>(recipients: R) -> GcmMessageBuilder
    where
        R: Into<Recipients>,
    {
        GcmMessageBuilder {
            message: GcmMessage {
                recipients: recipients.into(),
                collapse_key: None,
                data: None,
                notification: None,
                delay_while_idle: None,
                time_to_live: None,
                restricted_package_name: None,
                dry_run: None,
                content_available: None,
                priority: None,
            },
        }
    }

    /// Sets the payload data and the notification in one go.
    pub fn bulk_set(&mut self, data: Option<Map<String, Value>>, notification: Option<Notification>) {
        self.message.data = data;
        self.message.notification = notification;
    }

    pub fn set_recipients<R>(&mut self, recipients: R)
    where
        R: Into<Recipients>,
    {
        self.message.recipients = recipients.into();
    }

    pub fn set_data(&mut self, data: Map<String, Value>) {
        self.message.data = Some(data);
    }

    /// Adds one entry to the payload data, creating it if needed.
    pub fn add_data<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.message
            .data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
    }

    pub fn set_notification(&mut self, notification: Notification) {
        self.message.notification = Some(notification);
    }

    pub fn set_collapse_key<S>(&mut self, collapse_key: S)
    where
        S: Into<String>,
    {
        self.message.collapse_key = Some(collapse_key.into());
    }

    pub fn set_delay_while_idle(&mut self, delay_while_idle: bool) {
        self.message.delay_while_idle = Some(delay_while_idle);
    }

    /// How long the gateway should keep the message if it cannot be delivered
    /// currently, in seconds.
    pub fn set_time_to_live(&mut self, ttl: u32) {
        self.message.time_to_live = Some(ttl);
    }

    pub fn set_restricted_package_name<S>(&mut self, package_name: S)
    where
        S: Into<String>,
    {
        self.message.restricted_package_name = Some(package_name.into());
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.message.dry_run = Some(dry_run);
    }

    pub fn set_content_available(&mut self, content_available: bool) {
        self.message.content_available = Some(content_available);
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.message.priority = Some(priority);
    }

    pub fn build(self) -> GcmMessage {
        self.message
    }
}
