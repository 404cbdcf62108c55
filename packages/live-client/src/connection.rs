//! Connection lifecycle for the push channel
//!
//! A single background task owns the socket, the reconnect timer and the
//! heartbeat. It selects over:
//!
//! - commands from the [`LiveClient`](crate::LiveClient) facade
//! - token changes from the injected token source
//! - the current [`Link`] phase (opening, open, or backing off)
//! - heartbeat ticks
//!
//! `Link` holds at most one of "opening future", "open socket" or "backoff
//! timer", so replacing it cancels whatever was pending.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use coursehub_shared_config::LiveConfig;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, error, info, warn};

use crate::backoff::ReconnectPolicy;
use crate::endpoint::Endpoint;
use crate::error::{LiveError, LiveResult};
use crate::heartbeat::HeartbeatScheduler;
use crate::models::ConnectionStatus;
use crate::protocol::ClientFrame;
use crate::router::MessageRouter;
use crate::transport::{FrameSink, FrameStream, Transport};

/// Time allowed for a close handshake before the socket is simply dropped
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Requests from the facade to the connection task
#[derive(Debug)]
pub(crate) enum Command {
    /// Write a frame if the socket is open, drop it otherwise
    Send(ClientFrame),
    /// Drop the current socket and pending timers, connect again from attempt 0
    Reconnect,
    /// Close everything and stop the task
    Shutdown,
}

/// Socket phase owned by the connection task
enum Link {
    /// No socket, nothing scheduled (no token yet)
    Idle,
    /// Handshake in flight
    Opening(BoxFuture<'static, LiveResult<(FrameSink, FrameStream)>>),
    Open {
        sink: FrameSink,
        stream: FrameStream,
    },
    /// Reconnect timer armed
    Backoff(Pin<Box<Sleep>>),
    /// Retry budget exhausted
    Halted,
}

enum LinkEvent {
    Opened(LiveResult<(FrameSink, FrameStream)>),
    Frame(String),
    Errored(LiveError),
    Closed,
    RetryDue,
}

impl Link {
    fn is_active(&self) -> bool {
        matches!(self, Link::Opening(_) | Link::Open { .. } | Link::Backoff(_))
    }

    /// Wait for the next thing to happen in the current phase
    ///
    /// Cancel safe: all progress lives in `self`.
    async fn next_event(&mut self) -> LinkEvent {
        match self {
            Link::Opening(connecting) => LinkEvent::Opened(connecting.await),
            Link::Open { stream, .. } => match stream.next().await {
                Some(Ok(text)) => LinkEvent::Frame(text),
                Some(Err(e)) => LinkEvent::Errored(e),
                None => LinkEvent::Closed,
            },
            Link::Backoff(sleep) => {
                sleep.as_mut().await;
                LinkEvent::RetryDue
            }
            Link::Idle | Link::Halted => std::future::pending().await,
        }
    }
}

/// Handles returned to the facade when the task is spawned
pub(crate) struct ManagerHandle {
    pub(crate) commands: mpsc::UnboundedSender<Command>,
    pub(crate) status: watch::Receiver<ConnectionStatus>,
    pub(crate) attempts: Arc<AtomicU32>,
    pub(crate) task: JoinHandle<()>,
}

/// Owner of the socket lifecycle
pub(crate) struct ConnectionManager {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    heartbeat: HeartbeatScheduler,
    connect_timeout: Duration,
    tokens: watch::Receiver<Option<String>>,
    tokens_open: bool,
    /// Token used by the current link, if any
    current_token: Option<String>,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    attempts: Arc<AtomicU32>,
    router: MessageRouter,
    link: Link,
    attempt: u32,
}

impl ConnectionManager {
    /// Spawn the connection task on the current tokio runtime
    pub(crate) fn spawn(
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
        config: &LiveConfig,
        tokens: watch::Receiver<Option<String>>,
        router: MessageRouter,
    ) -> ManagerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let attempts = Arc::new(AtomicU32::new(0));

        let manager = Self {
            transport,
            endpoint,
            policy: ReconnectPolicy::from_config(config),
            heartbeat: HeartbeatScheduler::new(config.heartbeat_interval),
            connect_timeout: config.connect_timeout,
            tokens,
            tokens_open: true,
            current_token: None,
            commands: command_rx,
            status: status_tx,
            attempts: attempts.clone(),
            router,
            link: Link::Idle,
            attempt: 0,
        };

        let task = tokio::spawn(manager.run());

        ManagerHandle {
            commands: command_tx,
            status: status_rx,
            attempts,
            task,
        }
    }

    async fn run(mut self) {
        self.connect();

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Send(frame)) => self.safe_send(frame).await,
                    Some(Command::Reconnect) => self.restart("manual reconnect").await,
                    Some(Command::Shutdown) | None => break,
                },

                changed = self.tokens.changed(), if self.tokens_open => match changed {
                    Ok(()) => self.on_token_changed().await,
                    Err(_) => {
                        debug!("Token source dropped, keeping last token");
                        self.tokens_open = false;
                    }
                },

                _ = self.heartbeat.tick() => self.safe_send(ClientFrame::Ping).await,

                event = self.link.next_event() => self.on_link_event(event),
            }
        }

        self.teardown().await;
    }

    /// Start a connect attempt with the current token
    ///
    /// No-op while a socket is open or opening.
    fn connect(&mut self) {
        if matches!(self.link, Link::Opening(_) | Link::Open { .. }) {
            debug!("Socket already open or opening, skipping connect");
            return;
        }

        let token = self
            .tokens
            .borrow_and_update()
            .clone()
            .filter(|t| !t.is_empty());
        self.current_token = token.clone();

        let Some(token) = token else {
            debug!(channel = %self.endpoint.channel(), "No token available, waiting");
            self.link = Link::Idle;
            self.set_status(ConnectionStatus::Connecting);
            return;
        };

        info!(
            endpoint = %self.endpoint,
            attempt = self.attempt,
            "Connecting to push channel"
        );

        let connecting = self.transport.connect(self.endpoint.url_with_token(&token));
        let timeout = self.connect_timeout;
        self.link = Link::Opening(Box::pin(async move {
            match tokio::time::timeout(timeout, connecting).await {
                Ok(result) => result,
                Err(_) => Err(LiveError::ConnectTimeout),
            }
        }));
        self.set_status(ConnectionStatus::Connecting);
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened(Ok((sink, stream))) => {
                self.link = Link::Open { sink, stream };
                self.set_attempt(0);
                self.heartbeat.start();
                self.set_status(ConnectionStatus::Connected);
                info!(channel = %self.endpoint.channel(), "Push channel connected");
            }
            LinkEvent::Opened(Err(e)) => {
                warn!(error = %e, transient = e.is_transient(), "Connection attempt failed");
                self.on_close();
            }
            LinkEvent::Frame(text) => self.router.route(&text),
            LinkEvent::Errored(e) => {
                // The close that follows drives the reconnect.
                warn!(error = %e, "Socket error");
                self.heartbeat.stop();
                self.set_status(ConnectionStatus::Error);
            }
            LinkEvent::Closed => {
                info!(channel = %self.endpoint.channel(), "Push channel closed");
                self.on_close();
            }
            LinkEvent::RetryDue => self.connect(),
        }
    }

    /// Socket gone: stop the heartbeat and schedule the next attempt
    fn on_close(&mut self) {
        self.heartbeat.stop();
        self.link = Link::Idle;
        self.set_status(ConnectionStatus::Error);
        self.set_attempt(self.attempt.saturating_add(1));

        if self.policy.is_exhausted(self.attempt) {
            warn!(
                attempt = self.attempt,
                max_attempts = ?self.policy.max_attempts(),
                "Reconnect attempts exhausted, giving up"
            );
            self.link = Link::Halted;
            self.set_status(ConnectionStatus::Disconnected);
            return;
        }

        let delay = self.policy.delay(self.attempt);
        info!(
            attempt = self.attempt,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        self.link = Link::Backoff(Box::pin(tokio::time::sleep(delay)));
    }

    /// Drop the current link and connect again from attempt 0
    async fn restart(&mut self, reason: &'static str) {
        info!(reason, "Restarting push connection");
        self.heartbeat.stop();
        self.close_link().await;
        self.set_attempt(0);
        self.connect();
    }

    async fn on_token_changed(&mut self) {
        let token = self.tokens.borrow().clone().filter(|t| !t.is_empty());
        if token == self.current_token && self.link.is_active() {
            debug!("Token republished unchanged, keeping connection");
            return;
        }
        self.restart("token changed").await;
    }

    /// Write a frame through the open socket; anything else drops it
    async fn safe_send(&mut self, frame: ClientFrame) {
        let action = frame.action();
        let Link::Open { sink, .. } = &mut self.link else {
            debug!(action, "Socket not open, dropping frame");
            return;
        };

        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                error!(action, error = %e, "Failed to encode frame");
                return;
            }
        };

        if let Err(e) = sink.send(text).await {
            warn!(action, error = %e, "Send failed, treating socket as closed");
            self.on_close();
        }
    }

    /// Replace the link with `Idle`, closing an open socket
    async fn close_link(&mut self) {
        if let Link::Open { mut sink, .. } = std::mem::replace(&mut self.link, Link::Idle) {
            match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
                Ok(Ok(())) => debug!("Socket closed"),
                Ok(Err(e)) => debug!(error = %e, "Error while closing socket"),
                Err(_) => debug!("Close handshake timed out, dropping socket"),
            }
        }
    }

    async fn teardown(&mut self) {
        self.heartbeat.stop();
        self.close_link().await;
        info!(channel = %self.endpoint.channel(), "Push connection shut down");
    }

    fn set_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
        self.attempts.store(attempt, Ordering::SeqCst);
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            debug!(status = %status, "Connection status changed");
        }
    }
}
