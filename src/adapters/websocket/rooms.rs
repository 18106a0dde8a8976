//! Room management for realtime chat routing.
//!
//! Rooms are named channels a connection can belong to. Every connection
//! sits in its user's room (`user:{id}`), and joins a conversation room
//! (`conversation:{id}`) per conversation it participates in.
//!
//! # Architecture
//!
//! ```text
//! Room: user:alice           Room: conversation:42
//! ├── client-a (tab 1)       ├── client-a (alice)
//! └── client-b (tab 2)       └── client-c (bob)
//! ```
//!
//! Delivery goes through per-client outboxes rather than per-room channels:
//! a connection belongs to many rooms at once, and typing notifications
//! must skip the sender's own connections, so rooms hold membership sets
//! and fan-out walks the members.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::ClientId;

use super::messages::ServerEvent;

/// A named delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// All of one user's open connections.
    User(UserId),
    /// All connections subscribed to one conversation.
    Conversation(ConversationId),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::User(user_id) => write!(f, "user:{}", user_id),
            RoomId::Conversation(conversation_id) => {
                write!(f, "conversation:{}", conversation_id)
            }
        }
    }
}

/// Manages room membership and event delivery to connections.
///
/// # Thread Safety
///
/// Uses `RwLock` since broadcasts (reads) vastly outnumber joins and
/// leaves (writes). Outboxes are unbounded senders; a dropped receiver
/// makes sends fail silently, which disconnect cleanup then reaps.
pub struct RoomManager {
    /// Room → member connections.
    members: RwLock<HashMap<RoomId, HashSet<ClientId>>>,

    /// Connection → rooms it belongs to, for O(rooms) cleanup on disconnect.
    client_rooms: RwLock<HashMap<ClientId, HashSet<RoomId>>>,

    /// Connection → its outbox.
    outboxes: RwLock<HashMap<ClientId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl RoomManager {
    /// Create an empty room manager.
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
            client_rooms: RwLock::new(HashMap::new()),
            outboxes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection's outbox. Must be called before any join.
    pub async fn connect(&self, client_id: ClientId, outbox: mpsc::UnboundedSender<ServerEvent>) {
        self.outboxes.write().await.insert(client_id, outbox);
        self.client_rooms
            .write()
            .await
            .insert(client_id, HashSet::new());
    }

    /// Remove a connection from every room and drop its outbox.
    ///
    /// Rooms left empty are removed.
    pub async fn disconnect(&self, client_id: &ClientId) {
        self.outboxes.write().await.remove(client_id);

        let rooms = self.client_rooms.write().await.remove(client_id);
        if let Some(rooms) = rooms {
            let mut members = self.members.write().await;
            for room in rooms {
                if let Some(set) = members.get_mut(&room) {
                    set.remove(client_id);
                    if set.is_empty() {
                        members.remove(&room);
                    }
                }
            }
        }
    }

    /// Join a connection to a room. Creates the room if absent; joining
    /// twice is a no-op.
    pub async fn join(&self, room: RoomId, client_id: ClientId) {
        self.members
            .write()
            .await
            .entry(room.clone())
            .or_default()
            .insert(client_id);

        if let Some(rooms) = self.client_rooms.write().await.get_mut(&client_id) {
            rooms.insert(room);
        }
    }

    /// Deliver an event to every connection in a room.
    ///
    /// If the room doesn't exist this is a no-op.
    pub async fn broadcast(&self, room: &RoomId, event: ServerEvent) {
        self.broadcast_filtered(room, event, None).await;
    }

    /// Deliver an event to every connection in a room except one.
    ///
    /// Used for typing notifications, which must not echo back to the
    /// typist's originating connection.
    pub async fn broadcast_except(&self, room: &RoomId, except: &ClientId, event: ServerEvent) {
        self.broadcast_filtered(room, event, Some(except)).await;
    }

    /// Deliver an event to a single connection.
    pub async fn send_to(&self, client_id: &ClientId, event: ServerEvent) {
        let outboxes = self.outboxes.read().await;
        if let Some(outbox) = outboxes.get(client_id) {
            // A closed outbox means the drain task is gone; disconnect
            // cleanup will remove the entry.
            let _ = outbox.send(event);
        }
    }

    async fn broadcast_filtered(&self, room: &RoomId, event: ServerEvent, except: Option<&ClientId>) {
        let members = self.members.read().await;
        let Some(set) = members.get(room) else {
            return;
        };

        let outboxes = self.outboxes.read().await;
        for client_id in set {
            if Some(client_id) == except {
                continue;
            }
            if let Some(outbox) = outboxes.get(client_id) {
                let _ = outbox.send(event.clone());
            }
        }
    }

    /// Number of connections in a room (0 if the room doesn't exist).
    pub async fn room_size(&self, room: &RoomId) -> usize {
        self.members
            .read()
            .await
            .get(room)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// Whether a connection is a member of a room.
    pub async fn is_member(&self, room: &RoomId, client_id: &ClientId) -> bool {
        self.members
            .read()
            .await
            .get(room)
            .is_some_and(|set| set.contains(client_id))
    }

    /// All non-empty rooms (for monitoring/debugging).
    pub async fn active_rooms(&self) -> Vec<RoomId> {
        self.members.read().await.keys().cloned().collect()
    }

    /// Total count of registered connections.
    pub async fn total_client_count(&self) -> usize {
        self.outboxes.read().await.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
