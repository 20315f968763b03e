//! Change notifications between write handlers and subscription sockets.
//!
//! Handlers broadcast [`ListEvent::Changed`] after every successful write;
//! each socket subscribed to that list answers with a fresh snapshot.

use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Buffered notifications per list before a slow socket lags.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    /// The item set of the list changed.
    Changed,
}

/// Tracks subscribed sockets for broadcasting changes.
pub struct SyncHub {
    /// Broadcast channels keyed by list id
    channels: RwLock<HashMap<String, broadcast::Sender<ListEvent>>>,
}

impl SyncHub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to changes of a list.
    pub async fn subscribe(&self, list_id: &str) -> broadcast::Receiver<ListEvent> {
        let mut channels = self.channels.write().await;

        if let Some(sender) = channels.get(list_id) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
            channels.insert(list_id.to_string(), sender);
            receiver
        }
    }

    /// Notifies every subscriber of a list.
    pub async fn broadcast(&self, list_id: &str, event: ListEvent) {
        let channels = self.channels.read().await;

        if let Some(sender) = channels.get(list_id) {
            // No subscribers is fine
            let _ = sender.send(event);
        }
    }

    /// Drops the channel of a list once nobody listens to it.
    pub async fn release(&self, list_id: &str) {
        let mut channels = self.channels.write().await;

        if channels
            .get(list_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(list_id);
        }
    }

    pub async fn subscriber_count(&self, list_id: &str) -> usize {
        self.channels
            .read()
            .await
            .get(list_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}
