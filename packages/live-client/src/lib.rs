//! Live notification client for CourseHub
//!
//! This crate keeps a WebSocket open to the CourseHub push service and
//! mirrors the user's notifications locally:
//! - Connects once a session token is available and reconnects with linear backoff
//! - Sends a keep-alive ping while the socket is open
//! - Applies server snapshots and pushed notifications to a local cache
//! - Marks notifications read or deletes them optimistically
//!
//! # Example
//!
//! ```rust,no_run
//! use coursehub_live_client::{Channel, LiveClient, LiveConfig};
//! use tokio::sync::watch;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LiveConfig::from_env()?;
//! let (_token_tx, tokens) = watch::channel(Some("session-token".to_string()));
//!
//! let client = LiveClient::new(&config, Channel::Notifications, tokens)?;
//!
//! let mut changes = client.watch_changes();
//! changes.changed().await?;
//! println!("{} unread", client.unread_count());
//!
//! client.mark_all_as_read();
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! See [`LiveConfig::from_env`]:
//! - `LIVE_WS_URL`: Base WebSocket URL (default: `ws://localhost:8000`)
//! - `LIVE_HEARTBEAT_INTERVAL_MS`: Ping period (default: 20000)
//! - `LIVE_RECONNECT_BASE_DELAY_MS` / `LIVE_RECONNECT_MAX_DELAY_MS`: Backoff bounds
//! - `LIVE_RECONNECT_MAX_ATTEMPTS`: Retry budget (default: unbounded)
//! - `LIVE_CONNECT_TIMEOUT_SECS`: Handshake timeout (default: 10)

mod backoff;
mod client;
mod connection;
mod endpoint;
mod error;
mod heartbeat;
mod models;
mod protocol;
mod router;
mod store;
mod transport;

pub use backoff::ReconnectPolicy;
pub use client::LiveClient;
pub use endpoint::{Channel, Endpoint};
pub use error::{LiveError, LiveResult, ProtocolError};
pub use heartbeat::HeartbeatScheduler;
pub use models::{ConnectionStatus, Notification, NotificationId};
pub use protocol::{ClientFrame, InboundFrame};
pub use store::NotificationStore;
pub use transport::{FrameSink, FrameStream, Transport, WsTransport};

pub use coursehub_shared_config::LiveConfig;
