//! Fixtures and scheduling helpers

use std::time::Duration;

use coursehub_live_client::{Channel, ConnectionStatus, LiveClient, LiveConfig};
use serde_json::{json, Value};
use tokio::sync::watch;

use super::mocks::MockTransport;

pub const TOKEN: &str = "session-token";

/// Defaults: 20 s heartbeat, 2 s/30 s backoff, unbounded retries
pub fn test_config() -> LiveConfig {
    LiveConfig::default()
}

/// Client over a fresh mock transport, with the token already available
pub fn connected_client() -> (LiveClient, MockTransport, watch::Sender<Option<String>>) {
    client_with(test_config(), Some(TOKEN))
}

pub fn client_with(
    config: LiveConfig,
    token: Option<&str>,
) -> (LiveClient, MockTransport, watch::Sender<Option<String>>) {
    let transport = MockTransport::new();
    let (token_tx, tokens) = watch::channel(token.map(str::to_string));
    let client = LiveClient::with_transport(&config, Channel::Notifications, tokens, transport.clone())
        .expect("valid test config");
    (client, transport, token_tx)
}

/// Let the connection task drain everything that is ready, without moving the clock
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Move the paused clock forward, then let the task react
pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}

pub async fn advance_ms(ms: u64) {
    advance(Duration::from_millis(ms)).await;
}

pub fn status(client: &LiveClient) -> ConnectionStatus {
    client.connection_status()
}

pub fn notification(id: i64, read: bool) -> Value {
    json!({ "id": id, "read": read, "title": format!("Notification {id}") })
}

pub fn snapshot(items: &[(i64, bool)]) -> Value {
    Value::Array(items.iter().map(|&(id, read)| notification(id, read)).collect())
}
