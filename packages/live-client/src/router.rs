//! Inbound frame routing

use tracing::{debug, warn};

use crate::protocol::InboundFrame;
use crate::store::SharedStore;

/// Decodes inbound text frames and applies them to the store
#[derive(Debug, Clone)]
pub(crate) struct MessageRouter {
    store: SharedStore,
}

impl MessageRouter {
    pub(crate) fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Apply one frame
    ///
    /// Rejected frames and skipped snapshot elements are logged here and
    /// never affect the connection.
    pub(crate) fn route(&self, text: &str) {
        let frame = match InboundFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    category = e.category(),
                    error = %e,
                    frame_len = text.len(),
                    "Dropping inbound frame"
                );
                return;
            }
        };

        match frame {
            InboundFrame::Snapshot {
                notifications,
                skipped,
            } => {
                for e in &skipped {
                    warn!(category = e.category(), error = %e, "Skipping snapshot element");
                }
                let len = notifications.len();
                let unread = self.store.update(|store| {
                    store.replace(notifications);
                    store.unread_count()
                });
                debug!(len, skipped = skipped.len(), unread, "Applied notification snapshot");
            }
            InboundFrame::Notification(notification) => {
                let id = notification.id.clone();
                let unread = self.store.update(|store| {
                    store.prepend(notification);
                    store.unread_count()
                });
                debug!(id = ?id, unread, "Received notification");
            }
        }
    }
}
