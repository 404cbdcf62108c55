//! Live client error types

use thiserror::Error;

/// Reasons an inbound frame was rejected
///
/// Protocol errors never affect the connection: the frame is logged and
/// dropped.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not valid JSON
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Valid JSON of a kind the protocol has no variant for
    #[error("unrecognized {kind} frame")]
    Unrecognized { kind: &'static str },

    /// Notification object has an `id` that is neither a number nor a string
    #[error("invalid notification: {0}")]
    InvalidNotification(#[source] serde_json::Error),

    /// One element of a snapshot array failed to decode
    #[error("invalid snapshot element at index {index}: {reason}")]
    InvalidSnapshotElement { index: usize, reason: String },
}

impl ProtocolError {
    /// Short category name used in log fields
    pub fn category(&self) -> &'static str {
        match self {
            ProtocolError::Malformed(_) => "malformed",
            ProtocolError::Unrecognized { .. } => "unrecognized",
            ProtocolError::InvalidNotification(_) => "invalid_notification",
            ProtocolError::InvalidSnapshotElement { .. } => "invalid_snapshot",
        }
    }
}

/// Live client errors
#[derive(Error, Debug)]
pub enum LiveError {
    /// Configured base URL or channel scope does not form a valid endpoint
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration was rejected before the client started
    #[error("invalid configuration: {0}")]
    Config(#[from] coursehub_shared_config::ConfigError),

    /// WebSocket handshake or I/O failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Transport-level failure reported by a non-WebSocket transport
    #[error("transport error: {0}")]
    Transport(String),

    /// Handshake did not complete within the connect timeout
    #[error("connection attempt timed out")]
    ConnectTimeout,

    /// Inbound frame could not be decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Outgoing frame could not be serialized
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl LiveError {
    /// Check if this error is transient (a retry may succeed)
    ///
    /// Transport failures and timeouts are transient. Configuration, URL and
    /// encoding errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LiveError::WebSocket(_) | LiveError::Transport(_) | LiveError::ConnectTimeout
        )
    }
}

/// Result type for live client operations
pub type LiveResult<T> = Result<T, LiveError>;
