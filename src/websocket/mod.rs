//! Live connection registry.
//!
//! A process-local multi-map from participant identity to that identity's
//! open realtime connections. Frames are routed to the two participants of
//! a conversation only, never process-wide. Registration, unregistration
//! and sends all serialize through the inner lock; a send failure to one
//! connection drops that connection without aborting delivery to the rest.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;

/// Unique identifier for one registered connection, used for precise
/// cleanup when a connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<String>,
}

#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    // user_id -> connections of that user
    inner: Arc<RwLock<HashMap<Uuid, Vec<Subscriber>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user. Returns the subscriber id for
    /// cleanup and the channel the connection reads outbound frames from.
    pub async fn register(&self, user_id: Uuid) -> (SubscriberId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard.entry(user_id).or_default().push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });
        tracing::debug!(
            %user_id,
            connections = guard.get(&user_id).map(|v| v.len()).unwrap_or(0),
            "registered realtime connection"
        );

        (subscriber_id, rx)
    }

    /// Remove one connection. Safe to call when already gone.
    pub async fn unregister(&self, user_id: Uuid, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&user_id) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Best-effort delivery to every connection of one user; connections
    /// whose receiving half is gone are dropped on the way.
    pub async fn send_to_user(&self, user_id: Uuid, frame: &str) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&user_id) {
            subscribers.retain(|s| s.sender.send(frame.to_string()).is_ok());
            if subscribers.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Deliver a frame to both participants of a conversation pair.
    pub async fn send_to_pair(&self, a: Uuid, b: Uuid, frame: &str) {
        self.send_to_user(a, frame).await;
        if a != b {
            self.send_to_user(b, frame).await;
        }
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .get(&user_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_send_unregister() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (id, mut rx) = registry.register(user).await;
        assert_eq!(registry.connection_count(user).await, 1);

        registry.send_to_user(user, "hello").await;
        assert_eq!(rx.recv().await.unwrap(), "hello");

        registry.unregister(user, id).await;
        assert_eq!(registry.connection_count(user).await, 0);
    }

    #[tokio::test]
    async fn unregister_absent_is_safe() {
        let registry = ConnectionRegistry::new();
        registry.unregister(Uuid::new_v4(), SubscriberId::new()).await;
    }

    #[tokio::test]
    async fn pair_delivery_reaches_both_and_only_the_pair() {
        let registry = ConnectionRegistry::new();
        let (alice, bob, eve) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (_, mut alice_rx) = registry.register(alice).await;
        let (_, mut bob_rx) = registry.register(bob).await;
        let (_, mut eve_rx) = registry.register(eve).await;

        registry.send_to_pair(alice, bob, "ping").await;
        assert_eq!(alice_rx.recv().await.unwrap(), "ping");
        assert_eq!(bob_rx.recv().await.unwrap(), "ping");
        assert!(eve_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_connection_does_not_block_the_rest() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (_, rx_dead) = registry.register(user).await;
        let (_, mut rx_live) = registry.register(user).await;
        drop(rx_dead);

        registry.send_to_user(user, "still here").await;
        assert_eq!(rx_live.recv().await.unwrap(), "still here");
        assert_eq!(registry.connection_count(user).await, 1);
    }

    #[tokio::test]
    async fn self_pair_delivers_once_per_connection() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (_, mut rx) = registry.register(user).await;

        registry.send_to_pair(user, user, "echo").await;
        assert_eq!(rx.recv().await.unwrap(), "echo");
        assert!(rx.try_recv().is_err());
    }
}
