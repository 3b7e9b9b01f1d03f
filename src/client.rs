//! Connection handle definition
//!
//! Represents one joined connection: its identity, display name and the
//! sending half of its outbound queue. Knows nothing about rooms.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use crate::error::DeliveryError;
use crate::message::Envelope;
use crate::types::ClientId;

/// Joined connection
///
/// Cheap to clone: the room keeps one clone, the owning connection task
/// keeps another. The writer task for the connection ends once every
/// clone (and so every sender) has been dropped.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Display name, unique within the room
    pub username: String,
    /// Relay → client envelope queue
    sender: mpsc::Sender<Envelope>,
    /// Cleared once a delivery fails or the connection is leaving
    alive: Arc<AtomicBool>,
    /// Wakes the owning connection task when it must disconnect
    evict: Arc<Notify>,
}

impl ConnectionHandle {
    /// Create a new handle with the given ID, name and queue sender
    pub fn new(id: ClientId, username: impl Into<String>, sender: mpsc::Sender<Envelope>) -> Self {
        Self {
            id,
            username: username.into(),
            sender,
            alive: Arc::new(AtomicBool::new(true)),
            evict: Arc::new(Notify::new()),
        }
    }

    /// Enqueue an envelope without waiting
    ///
    /// A full or closed queue marks the handle dead and signals eviction.
    pub fn deliver(&self, envelope: Envelope) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Closed);
        }
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.mark_dead();
                Err(DeliveryError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(DeliveryError::Closed)
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Flag the connection for asynchronous disconnection
    pub fn mark_dead(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            self.evict.notify_one();
        }
    }

    /// Resolves once the handle has been marked dead
    pub async fn evicted(&self) {
        if !self.is_alive() {
            return;
        }
        self.evict.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_handle_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let handle = ConnectionHandle::new(ClientId::new(), "Alice", tx);

        assert_eq!(handle.username, "Alice");
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_deliver_enqueues_in_order() {
        let (tx, mut rx) = mpsc::channel(32);
        let handle = ConnectionHandle::new(ClientId::new(), "Alice", tx);

        handle.deliver(Envelope::notice("one")).unwrap();
        handle.deliver(Envelope::notice("two")).unwrap();

        assert_eq!(rx.recv().await, Some(Envelope::notice("one")));
        assert_eq!(rx.recv().await, Some(Envelope::notice("two")));
    }

    #[tokio::test]
    async fn test_full_queue_marks_dead_and_evicts() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(ClientId::new(), "Slow", tx);

        handle.deliver(Envelope::notice("fills")).unwrap();
        assert_eq!(
            handle.deliver(Envelope::notice("overflows")),
            Err(DeliveryError::QueueFull)
        );
        assert!(!handle.is_alive());

        tokio::time::timeout(Duration::from_secs(1), handle.evicted())
            .await
            .expect("eviction should be signalled");

        // Dead handles refuse further deliveries
        assert_eq!(
            handle.deliver(Envelope::notice("late")),
            Err(DeliveryError::Closed)
        );
    }

    #[tokio::test]
    async fn test_closed_queue_marks_dead() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(ClientId::new(), "Gone", tx);
        drop(rx);

        assert_eq!(handle.deliver(Envelope::notice("x")), Err(DeliveryError::Closed));
        assert!(!handle.is_alive());
    }
}
