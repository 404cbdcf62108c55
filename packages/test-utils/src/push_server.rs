//! Mock push server for testing live notification clients
//!
//! Provides a [`MockPushServer`] that accepts real WebSocket connections on
//! localhost, records what clients request and send, and lets tests push
//! frames or drop connections at will.
//!
//! # Lock Poisoning Recovery
//!
//! Locks are acquired with `unwrap_or_else(|e| e.into_inner())` so a test that
//! panics while holding one does not cascade into other tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::debug;

/// How long the `wait_for_*` helpers wait before panicking
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

enum Outbound {
    Text(String),
    Close,
}

#[derive(Default)]
struct ServerState {
    /// Request targets (path and query) of every accepted handshake
    requests: Mutex<Vec<String>>,
    /// Text frames received from clients, in arrival order
    received: Mutex<Vec<String>>,
    /// Frames sent to every client right after its handshake
    greeting: Mutex<Vec<String>>,
    /// Senders for currently open connections
    peers: Mutex<Vec<mpsc::UnboundedSender<Outbound>>>,
    accepted: AtomicUsize,
    changed: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Local WebSocket server for push channel tests
///
/// Binds an ephemeral port on `127.0.0.1`. The accept loop stops when the
/// server is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let server = MockPushServer::start().await;
/// // connect a client to server.url() ...
/// server.wait_for_connections(1).await;
/// server.push(r#"{"id":1,"read":false}"#);
/// server.wait_for_received(1).await;
/// assert_eq!(server.received()[0], r#"{"action":"ping"}"#);
/// ```
pub struct MockPushServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_task: JoinHandle<()>,
}

impl MockPushServer {
    /// Start a new mock push server
    ///
    /// # Panics
    /// If no local port can be bound
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock push server");
        let addr = listener.local_addr().expect("bound listener has an address");
        let state = Arc::new(ServerState::default());

        let accept_state = state.clone();
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                debug!(%peer, "Mock push server accepted TCP connection");
                tokio::spawn(serve(stream, accept_state.clone()));
            }
        });

        Self {
            addr,
            state,
            accept_task,
        }
    }

    /// Base WebSocket URL, e.g. `ws://127.0.0.1:41234`
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send `frame` to each client as soon as its handshake completes
    pub fn greet_with(&self, frame: impl Into<String>) {
        lock(&self.state.greeting).push(frame.into());
    }

    /// Send a text frame to every open connection
    pub fn push(&self, frame: impl Into<String>) {
        let frame = frame.into();
        lock(&self.state.peers).retain(|peer| peer.send(Outbound::Text(frame.clone())).is_ok());
    }

    /// Close every open connection from the server side
    pub fn drop_connections(&self) {
        for peer in lock(&self.state.peers).drain(..) {
            let _ = peer.send(Outbound::Close);
        }
    }

    /// Number of completed handshakes so far
    pub fn connection_count(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Number of connections still open
    pub fn open_connections(&self) -> usize {
        let mut peers = lock(&self.state.peers);
        peers.retain(|peer| !peer.is_closed());
        peers.len()
    }

    /// Request targets of every handshake, e.g. `/ws/notifications/?token=abc`
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state.requests).clone()
    }

    /// Text frames received from clients
    pub fn received(&self) -> Vec<String> {
        lock(&self.state.received).clone()
    }

    /// Received frames parsed as JSON; unparseable frames are skipped
    pub fn received_json(&self) -> Vec<serde_json::Value> {
        self.received()
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Wait until at least `n` handshakes have completed
    ///
    /// # Panics
    /// After five seconds without reaching `n`
    pub async fn wait_for_connections(&self, n: usize) {
        self.wait_until(|| self.connection_count() >= n, "connections")
            .await;
    }

    /// Wait until at least `n` frames have been received
    ///
    /// # Panics
    /// After five seconds without reaching `n`
    pub async fn wait_for_received(&self, n: usize) {
        self.wait_until(|| lock(&self.state.received).len() >= n, "received frames")
            .await;
    }

    async fn wait_until(&self, done: impl Fn() -> bool, what: &str) {
        let wait = async {
            loop {
                let changed = self.state.changed.notified();
                if done() {
                    return;
                }
                changed.await;
            }
        };
        if tokio::time::timeout(WAIT_TIMEOUT, wait).await.is_err() {
            panic!("timed out waiting for {what}");
        }
    }
}

impl Drop for MockPushServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.drop_connections();
    }
}

async fn serve(stream: TcpStream, state: Arc<ServerState>) {
    let mut target = None;
    let record_target = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        target = Some(request.uri().to_string());
        Ok(response)
    };

    let ws = match tokio_tungstenite::accept_hdr_async(stream, record_target).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(error = %e, "Mock push server handshake failed");
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    for frame in lock(&state.greeting).iter() {
        let _ = tx.send(Outbound::Text(frame.clone()));
    }
    lock(&state.requests).push(target.unwrap_or_default());
    lock(&state.peers).push(tx);
    state.accepted.fetch_add(1, Ordering::SeqCst);
    state.changed.notify_waiters();

    let (mut sink, mut source) = ws.split();
    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    lock(&state.received).push(text.as_str().to_owned());
                    state.changed.notify_waiters();
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("Mock push server connection finished");
    state.changed.notify_waiters();
}
