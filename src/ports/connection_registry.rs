//! Connection registry port.
//!
//! Tracks which live realtime connections belong to which authenticated
//! user. The registry is injected and lifecycle-scoped rather than a
//! process-wide singleton, so a distributed presence backend can replace
//! the in-memory one if the service is ever scaled horizontally.
//!
//! State here is ephemeral: it is rebuilt from nothing on restart because
//! clients simply reconnect.

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::UserId;

/// Unique identifier for a single realtime connection.
///
/// Generated server-side when a socket is accepted; a user with several
/// open tabs holds several client ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Create a new random client id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port for tracking live connections per user.
///
/// Implementations must support multiple simultaneous connections per user
/// and drop a user's entry entirely once their last connection closes.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Record a new connection for the user.
    async fn register(&self, user_id: &UserId, client_id: ClientId);

    /// Remove a connection; removes the user's entry if it was their last.
    async fn unregister(&self, user_id: &UserId, client_id: &ClientId);

    /// All currently open connections for the user.
    async fn connections_for(&self, user_id: &UserId) -> Vec<ClientId>;

    /// Whether the user has at least one open connection.
    async fn is_connected(&self, user_id: &UserId) -> bool;

    /// Number of users with at least one open connection.
    async fn connected_user_count(&self) -> usize;
}
