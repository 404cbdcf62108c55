//! Public facade over the live notification channel

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use coursehub_shared_config::LiveConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::connection::{Command, ConnectionManager};
use crate::endpoint::{Channel, Endpoint};
use crate::error::LiveResult;
use crate::models::{ConnectionStatus, Notification, NotificationId};
use crate::router::MessageRouter;
use crate::store::SharedStore;
use crate::transport::{Transport, WsTransport};

/// Live notification client
///
/// Connects as soon as the token source holds a token, keeps the socket
/// alive, reconnects with backoff and mirrors the server's notifications
/// locally. Mutations update the local cache immediately and send the
/// matching frame if the socket is open at that moment.
///
/// Dropping the client closes the socket and stops all timers.
pub struct LiveClient {
    channel: Channel,
    store: SharedStore,
    status: watch::Receiver<ConnectionStatus>,
    attempts: Arc<AtomicU32>,
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveClient")
            .field("channel", &self.channel)
            .field("status", &*self.status.borrow())
            .field("unread", &self.unread_count())
            .finish()
    }
}

impl LiveClient {
    /// Create a client over WebSocket
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// - `LiveError::Config` if the configuration fails validation
    /// - `LiveError::InvalidUrl` if the channel URL cannot be built
    pub fn new(
        config: &LiveConfig,
        channel: Channel,
        tokens: watch::Receiver<Option<String>>,
    ) -> LiveResult<Self> {
        Self::with_transport(config, channel, tokens, WsTransport)
    }

    /// Create a client over a custom transport
    #[instrument(skip(config, tokens, transport))]
    pub fn with_transport<T: Transport>(
        config: &LiveConfig,
        channel: Channel,
        tokens: watch::Receiver<Option<String>>,
        transport: T,
    ) -> LiveResult<Self> {
        config.validate()?;
        let endpoint = Endpoint::new(&config.ws_url, channel.clone())?;

        let store = SharedStore::new();
        let router = MessageRouter::new(store.clone());
        let handle =
            ConnectionManager::spawn(Arc::new(transport), endpoint, config, tokens, router);

        debug!(channel = %channel, "Live client started");

        Ok(Self {
            channel,
            store,
            status: handle.status,
            attempts: handle.attempts,
            commands: handle.commands,
            task: Some(handle.task),
        })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Current notifications, newest first for pushed items
    pub fn notifications(&self) -> Vec<Notification> {
        self.store.read(|store| store.notifications().to_vec())
    }

    pub fn notification(&self, id: &NotificationId) -> Option<Notification> {
        self.store.read(|store| store.get(id).cloned())
    }

    pub fn unread_count(&self) -> usize {
        self.store.read(|store| store.unread_count())
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that wakes on every status transition
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Receiver that wakes whenever the notification list or unread count changes
    pub fn watch_changes(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Consecutive failed connection attempts since the last successful open
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Drop the current connection and any pending retry, then connect now
    pub fn reconnect(&self) {
        self.command(Command::Reconnect);
    }

    pub fn mark_as_read(&self, id: impl Into<NotificationId>) {
        let id = id.into();
        let frame = self.store.update(|store| store.mark_as_read(&id));
        self.command(Command::Send(frame));
    }

    pub fn mark_all_as_read(&self) {
        let frame = self.store.update(|store| store.mark_all_as_read());
        self.command(Command::Send(frame));
    }

    pub fn delete_notification(&self, id: impl Into<NotificationId>) {
        let id = id.into();
        let frame = self.store.update(|store| store.delete(&id));
        self.command(Command::Send(frame));
    }

    /// Close the socket, stop all timers and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.command(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Live connection task ended abnormally");
            }
        }
    }

    fn command(&self, command: Command) {
        if let Err(mpsc::error::SendError(command)) = self.commands.send(command) {
            let action = match &command {
                Command::Send(frame) => frame.action(),
                Command::Reconnect => "reconnect",
                Command::Shutdown => "shutdown",
            };
            debug!(action, "Live connection task stopped, dropping command");
        }
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(Command::Shutdown);
        }
    }
}
