//! Notification and connection state types

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Identity of a notification as assigned by the server
///
/// The push service uses numeric ids for persisted notifications and string
/// ids for some live-class events, so both shapes are accepted. Numbers are
/// kept as sent so they echo back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationId {
    Number(Number),
    Text(String),
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationId::Number(n) => write!(f, "{}", n),
            NotificationId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for NotificationId {
    fn from(id: i64) -> Self {
        NotificationId::Number(id.into())
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        NotificationId::Text(id.to_string())
    }
}

impl From<String> for NotificationId {
    fn from(id: String) -> Self {
        NotificationId::Text(id)
    }
}

/// A server-pushed notification
///
/// Only `id` and `read` are interpreted by the client. Every other field is
/// kept in `payload` and serialized back unchanged.
///
/// Live-class announcements may arrive without an `id`; they are listed but
/// cannot be targeted by mark-as-read or delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NotificationId>,

    /// `None` when the server sent no boolean `read` field
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub read: Option<bool>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Accept any JSON value for `read`, keeping it only if it is a boolean
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool())
}

impl Notification {
    pub fn new(id: impl Into<NotificationId>, read: bool) -> Self {
        Self {
            id: Some(id.into()),
            read: Some(read),
            payload: Map::new(),
        }
    }

    /// A notification the server sent without an `id`
    pub fn without_id(read: bool) -> Self {
        Self {
            id: None,
            read: Some(read),
            payload: Map::new(),
        }
    }

    pub fn has_id(&self, id: &NotificationId) -> bool {
        self.id.as_ref() == Some(id)
    }

    /// Attach an extra payload field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Unread means an explicit `read: false`; a missing flag is not unread.
    pub fn is_unread(&self) -> bool {
        self.read == Some(false)
    }
}

/// Connection state as seen by consumers of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Waiting for a token or a handshake in flight
    #[default]
    Connecting,
    /// Socket open, heartbeat running
    Connected,
    /// Socket closed or broken, retry pending
    Error,
    /// Retry budget exhausted; only a manual reconnect or new token resumes
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Error => write!(f, "error"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}
