//! In-memory connection registry.
//!
//! Tracks which live socket connections belong to which user. Rebuilt
//! from nothing on restart; clients reconnect.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{ClientId, ConnectionRegistry};

/// Process-local connection registry backed by a `RwLock`ed map.
pub struct InMemoryConnectionRegistry {
    connections: RwLock<HashMap<UserId, Vec<ClientId>>>,
}

impl InMemoryConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, user_id: &UserId, client_id: ClientId) {
        let mut connections = self.connections.write().await;
        connections
            .entry(user_id.clone())
            .or_default()
            .push(client_id);
    }

    async fn unregister(&self, user_id: &UserId, client_id: &ClientId) {
        let mut connections = self.connections.write().await;
        if let Some(clients) = connections.get_mut(user_id) {
            clients.retain(|c| c != client_id);
            if clients.is_empty() {
                connections.remove(user_id);
            }
        }
    }

    async fn connections_for(&self, user_id: &UserId) -> Vec<ClientId> {
        self.connections
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn is_connected(&self, user_id: &UserId) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    async fn connected_user_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn register_makes_user_connected() {
        let registry = InMemoryConnectionRegistry::new();
        let alice = user("alice");

        assert!(!registry.is_connected(&alice).await);

        registry.register(&alice, ClientId::new()).await;

        assert!(registry.is_connected(&alice).await);
        assert_eq!(registry.connected_user_count().await, 1);
    }

    #[tokio::test]
    async fn user_can_hold_multiple_connections() {
        let registry = InMemoryConnectionRegistry::new();
        let alice = user("alice");
        let tab1 = ClientId::new();
        let tab2 = ClientId::new();

        registry.register(&alice, tab1).await;
        registry.register(&alice, tab2).await;

        let connections = registry.connections_for(&alice).await;
        assert_eq!(connections.len(), 2);
        assert!(connections.contains(&tab1));
        assert!(connections.contains(&tab2));
        assert_eq!(registry.connected_user_count().await, 1);
    }

    #[tokio::test]
    async fn unregister_last_connection_removes_user() {
        let registry = InMemoryConnectionRegistry::new();
        let alice = user("alice");
        let tab1 = ClientId::new();
        let tab2 = ClientId::new();

        registry.register(&alice, tab1).await;
        registry.register(&alice, tab2).await;

        registry.unregister(&alice, &tab1).await;
        assert!(registry.is_connected(&alice).await);

        registry.unregister(&alice, &tab2).await;
        assert!(!registry.is_connected(&alice).await);
        assert_eq!(registry.connected_user_count().await, 0);
    }

    #[tokio::test]
    async fn unregister_unknown_connection_is_noop() {
        let registry = InMemoryConnectionRegistry::new();
        let alice = user("alice");

        registry.unregister(&alice, &ClientId::new()).await;

        assert!(!registry.is_connected(&alice).await);
    }
}
