//! Scripted in-memory transport
//!
//! Every `connect` call is recorded. Successful connects hand the client a
//! socket whose server side is exposed as a [`MockConnection`], so tests can
//! push frames, raise errors, close the socket and inspect what was sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use coursehub_live_client::{FrameSink, FrameStream, LiveError, LiveResult, Transport};
use futures_util::future::{self, BoxFuture};
use futures_util::{stream, FutureExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

/// Outcome scripted for a future connect call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectScript {
    Accept,
    Refuse,
    /// Never resolve, so the client's connect timeout fires
    Hang,
}

#[derive(Default)]
struct MockState {
    urls: Vec<Url>,
    scripts: VecDeque<ConnectScript>,
    connections: Vec<MockConnection>,
    /// Cloned into every hanging handshake; extra strong counts are live ones
    hanging: Arc<()>,
}

/// Transport whose sockets live in memory
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the next connect calls; unscripted calls are accepted
    pub fn script(&self, outcomes: impl IntoIterator<Item = ConnectScript>) {
        self.state.lock().scripts.extend(outcomes);
    }

    /// Refuse the next `n` connect calls
    pub fn refuse_next(&self, n: usize) {
        self.script(std::iter::repeat(ConnectScript::Refuse).take(n));
    }

    /// Number of connect calls made so far
    pub fn connect_count(&self) -> usize {
        self.state.lock().urls.len()
    }

    pub fn urls(&self) -> Vec<Url> {
        self.state.lock().urls.clone()
    }

    pub fn last_url(&self) -> Option<Url> {
        self.state.lock().urls.last().cloned()
    }

    /// Sockets handed out so far, oldest first
    pub fn connections(&self) -> Vec<MockConnection> {
        self.state.lock().connections.clone()
    }

    /// Hanging handshakes the client is still holding on to
    pub fn pending_handshakes(&self) -> usize {
        Arc::strong_count(&self.state.lock().hanging) - 1
    }

    /// Most recently opened socket
    ///
    /// # Panics
    /// If no socket has been opened yet
    pub fn current(&self) -> MockConnection {
        self.state
            .lock()
            .connections
            .last()
            .cloned()
            .expect("no socket has been opened")
    }
}

impl Transport for MockTransport {
    fn connect(&self, url: Url) -> BoxFuture<'static, LiveResult<(FrameSink, FrameStream)>> {
        let mut state = self.state.lock();
        state.urls.push(url);

        match state.scripts.pop_front().unwrap_or(ConnectScript::Accept) {
            ConnectScript::Refuse => future::ready(Err(LiveError::Transport(
                "connection refused".to_string(),
            )))
            .boxed(),
            ConnectScript::Hang => {
                let guard = Arc::clone(&state.hanging);
                async move {
                    let _guard = guard;
                    future::pending().await
                }
                .boxed()
            }
            ConnectScript::Accept => {
                let (connection, sink, stream) = MockConnection::open();
                state.connections.push(connection);
                future::ready(Ok((sink, stream))).boxed()
            }
        }
    }
}

/// Server side of one in-memory socket
#[derive(Clone)]
pub struct MockConnection {
    inbound: Arc<Mutex<Option<mpsc::UnboundedSender<LiveResult<String>>>>>,
    sent: Arc<Mutex<Vec<String>>>,
    send_calls: Arc<AtomicUsize>,
    fail_sends: Arc<AtomicBool>,
}

impl MockConnection {
    fn open() -> (Self, FrameSink, FrameStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Self {
            inbound: Arc::new(Mutex::new(Some(tx))),
            sent: Arc::new(Mutex::new(Vec::new())),
            send_calls: Arc::new(AtomicUsize::new(0)),
            fail_sends: Arc::new(AtomicBool::new(false)),
        };

        let server = connection.clone();
        let sink: FrameSink = Box::pin(futures_util::sink::unfold(
            server,
            |server, text: String| async move {
                server.send_calls.fetch_add(1, Ordering::SeqCst);
                if server.fail_sends.load(Ordering::SeqCst) {
                    return Err(LiveError::Transport("broken pipe".to_string()));
                }
                server.sent.lock().push(text);
                Ok(server)
            },
        ));

        let stream: FrameStream = Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }));

        (connection, sink, stream)
    }

    /// Deliver a text frame to the client
    pub fn push(&self, text: impl Into<String>) {
        if let Some(tx) = self.inbound.lock().as_ref() {
            let _ = tx.send(Ok(text.into()));
        }
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push(value.to_string());
    }

    /// Raise a socket error event; the socket stays up until [`close`](Self::close)
    pub fn error(&self, message: &str) {
        if let Some(tx) = self.inbound.lock().as_ref() {
            let _ = tx.send(Err(LiveError::Transport(message.to_string())));
        }
    }

    /// Close the socket from the server side
    pub fn close(&self) {
        self.inbound.lock().take();
    }

    /// Make every further send on this socket fail
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Frames the client wrote, in order
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Sent frames parsed as JSON
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|text| serde_json::from_str(text).expect("client sent invalid JSON"))
            .collect()
    }

    /// Number of sent frames whose `action` is `action`
    pub fn sent_actions(&self, action: &str) -> usize {
        self.sent_json()
            .iter()
            .filter(|frame| frame["action"] == action)
            .count()
    }

    /// Every call into the sink, including failed ones
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Whether the client has let go of the socket
    pub fn is_dropped_by_client(&self) -> bool {
        self.inbound
            .lock()
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}
