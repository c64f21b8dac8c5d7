//! Registry of connected WebSocket clients
//!
//! Transport-agnostic: each client is an outbound channel. The socket task
//! drains its receiver and writes frames; the registry only fans out text.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub type ClientId = Uuid;

/// Outbound frames buffered per client before sends start failing
const CLIENT_BUFFER: usize = 256;

pub struct ConnectionManager {
    connections: RwLock<HashMap<ClientId, mpsc::Sender<String>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a client and return its id plus the receiver its socket
    /// task should drain.
    pub async fn connect(&self) -> (ClientId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        let id = Uuid::new_v4();

        let mut conns = self.connections.write().await;
        conns.insert(id, tx);
        tracing::info!(client_id = %id, clients = conns.len(), "websocket client connected");

        (id, rx)
    }

    /// Remove a client. Returns false if it was not registered.
    pub async fn disconnect(&self, id: ClientId) -> bool {
        let mut conns = self.connections.write().await;
        let removed = conns.remove(&id).is_some();
        if removed {
            tracing::info!(client_id = %id, clients = conns.len(), "websocket client disconnected");
        }
        removed
    }

    /// Queue a message for one client.
    pub async fn send_message(&self, id: ClientId, message: &str) -> bool {
        let conns = self.connections.read().await;
        match conns.get(&id) {
            Some(tx) => Self::deliver(id, tx, message),
            None => false,
        }
    }

    /// Queue a message for every client. Returns how many accepted it.
    ///
    /// A client whose buffer is full misses the message rather than
    /// stalling everyone else.
    pub async fn broadcast(&self, message: &str) -> usize {
        let conns = self.connections.read().await;
        let delivered = conns
            .iter()
            .filter(|(id, tx)| Self::deliver(**id, tx, message))
            .count();
        tracing::debug!(recipients = conns.len(), delivered, "broadcast");
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    fn deliver(id: ClientId, tx: &mpsc::Sender<String>, message: &str) -> bool {
        match tx.try_send(message.to_owned()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(client_id = %id, error = %e, "failed to queue message");
                false
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_client() {
        let manager = ConnectionManager::new();
        let (_a, mut rx_a) = manager.connect().await;
        let (_b, mut rx_b) = manager.connect().await;

        assert_eq!(manager.broadcast("hello").await, 2);
        assert_eq!(rx_a.recv().await.unwrap(), "hello");
        assert_eq!(rx_b.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn send_message_targets_one_client() {
        let manager = ConnectionManager::new();
        let (a, mut rx_a) = manager.connect().await;
        let (_b, mut rx_b) = manager.connect().await;

        assert!(manager.send_message(a, "just you").await);
        assert_eq!(rx_a.recv().await.unwrap(), "just you");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_removes_client() {
        let manager = ConnectionManager::new();
        let (a, _rx) = manager.connect().await;
        assert_eq!(manager.connection_count().await, 1);

        assert!(manager.disconnect(a).await);
        assert!(!manager.disconnect(a).await);
        assert_eq!(manager.connection_count().await, 0);
        assert!(!manager.send_message(a, "gone").await);
    }

    #[tokio::test]
    async fn dropped_receiver_is_skipped() {
        let manager = ConnectionManager::new();
        let (_a, rx_a) = manager.connect().await;
        let (_b, mut rx_b) = manager.connect().await;
        drop(rx_a);

        assert_eq!(manager.broadcast("still here").await, 1);
        assert_eq!(rx_b.recv().await.unwrap(), "still here");
    }
}
