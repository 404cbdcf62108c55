//! Local notification cache with an optimistic unread counter

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::models::{Notification, NotificationId};
use crate::protocol::ClientFrame;

/// In-memory notification list plus cached unread count
///
/// The unread count is recomputed only when a snapshot replaces the list;
/// every other change adjusts it by one. Mutations return the frame that
/// tells the server about the change.
#[derive(Debug, Default, Clone)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    unread: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a server snapshot, keeping its order
    pub fn replace(&mut self, notifications: Vec<Notification>) {
        self.unread = notifications.iter().filter(|n| n.is_unread()).count();
        self.notifications = notifications;
    }

    /// Insert a newly pushed notification at the front
    pub fn prepend(&mut self, notification: Notification) {
        if notification.is_unread() {
            self.unread += 1;
        }
        self.notifications.insert(0, notification);
    }

    /// Mark one notification read
    ///
    /// The frame is produced even when `id` is unknown locally, so the server
    /// still hears about items from a snapshot not received yet.
    pub fn mark_as_read(&mut self, id: &NotificationId) -> ClientFrame {
        if let Some(notification) = self
            .notifications
            .iter_mut()
            .find(|n| n.has_id(id) && n.is_unread())
        {
            notification.read = Some(true);
            self.unread = self.unread.saturating_sub(1);
        }
        ClientFrame::MarkAsRead {
            notification_id: id.clone(),
        }
    }

    pub fn mark_all_as_read(&mut self) -> ClientFrame {
        for notification in &mut self.notifications {
            notification.read = Some(true);
        }
        self.unread = 0;
        ClientFrame::MarkAllAsRead
    }

    /// Remove a notification
    ///
    /// The unread count is left alone, even when the removed item was unread.
    pub fn delete(&mut self, id: &NotificationId) -> ClientFrame {
        self.notifications.retain(|n| !n.has_id(id));
        ClientFrame::Delete {
            notification_id: id.clone(),
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.has_id(id))
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

/// Store handle shared by the facade and the connection task
///
/// Every `update` bumps a revision published on a watch channel.
#[derive(Debug, Clone)]
pub(crate) struct SharedStore {
    inner: Arc<Mutex<NotificationStore>>,
    revision: Arc<watch::Sender<u64>>,
}

impl SharedStore {
    pub(crate) fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(NotificationStore::new())),
            revision: Arc::new(revision),
        }
    }

    /// Apply a mutation; the lock is released before watchers are woken
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut NotificationStore) -> R) -> R {
        let result = {
            let mut store = self.inner.lock();
            f(&mut store)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&NotificationStore) -> R) -> R {
        f(&self.inner.lock())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
