//! WebSocket adapter for realtime chat.
//!
//! The realtime surface mirrors the REST endpoints: the same ChatService
//! operations, plus room-based fan-out of notifications to both parties.

pub mod connections;
pub mod gateway;
pub mod messages;
pub mod rooms;

pub use connections::InMemoryConnectionRegistry;
pub use gateway::{websocket_router, ChatGateway, ChatGatewayState};
pub use messages::{AckPayload, ClientEvent, ServerEvent};
pub use rooms::{RoomId, RoomManager};
