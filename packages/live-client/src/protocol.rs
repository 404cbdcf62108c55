//! Wire protocol for the notification push channel
//!
//! All frames are UTF-8 JSON text. Outgoing frames are tagged by `action`;
//! inbound frames are either a snapshot array or a single notification
//! object and are decoded strictly into [`InboundFrame`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::models::{Notification, NotificationId};

// =============================================================================
// Client -> Server
// =============================================================================

/// Frames sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Keep-alive
    Ping,

    /// Acknowledge a single notification
    MarkAsRead { notification_id: NotificationId },

    /// Acknowledge everything
    MarkAllAsRead,

    /// Remove a notification server-side
    Delete { notification_id: NotificationId },
}

impl ClientFrame {
    /// Value of the `action` tag, for logging
    pub fn action(&self) -> &'static str {
        match self {
            ClientFrame::Ping => "ping",
            ClientFrame::MarkAsRead { .. } => "mark_as_read",
            ClientFrame::MarkAllAsRead => "mark_all_as_read",
            ClientFrame::Delete { .. } => "delete",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Server -> Client
// =============================================================================

/// Frames received from the server
#[derive(Debug)]
pub enum InboundFrame {
    /// Full replacement of the notification list, in server order
    ///
    /// Elements that could not be decoded are reported in `skipped`; the
    /// rest still replace the list.
    Snapshot {
        notifications: Vec<Notification>,
        skipped: Vec<ProtocolError>,
    },

    /// A single new notification
    Notification(Notification),
}

impl InboundFrame {
    /// Decode a text frame
    ///
    /// An object is a notification when it has an `id` or declares
    /// `"type": "notification"`. Any object inside an array is a snapshot
    /// element.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

        match value {
            Value::Object(fields) => {
                let has_id = fields.contains_key("id");
                let typed = fields.get("type").and_then(Value::as_str) == Some("notification");
                if !has_id && !typed {
                    return Err(ProtocolError::Unrecognized { kind: "object" });
                }
                decode_notification(Value::Object(fields)).map(InboundFrame::Notification)
            }
            Value::Array(items) => {
                let mut notifications = Vec::with_capacity(items.len());
                let mut skipped = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    match decode_notification(item) {
                        Ok(notification) => notifications.push(notification),
                        Err(e) => skipped.push(ProtocolError::InvalidSnapshotElement {
                            index,
                            reason: e.to_string(),
                        }),
                    }
                }
                Ok(InboundFrame::Snapshot {
                    notifications,
                    skipped,
                })
            }
            other => Err(ProtocolError::Unrecognized {
                kind: json_kind(&other),
            }),
        }
    }
}

fn decode_notification(value: Value) -> Result<Notification, ProtocolError> {
    match value {
        Value::Object(_) => {
            serde_json::from_value(value).map_err(ProtocolError::InvalidNotification)
        }
        other => Err(ProtocolError::Unrecognized {
            kind: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
