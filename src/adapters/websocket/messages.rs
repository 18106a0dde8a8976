//! WebSocket event types for the realtime chat protocol.
//!
//! Defines the protocol between server and connected clients:
//! - Client → Server: sendMessage, typing, markAsRead, joinConversation
//! - Server → Client: newMessage, conversationUpdated, userTyping,
//!   messagesRead, ack
//!
//! Events reuse the HTTP views so REST and socket clients render
//! identical JSON for conversations and messages.

use serde::{Deserialize, Serialize};

use crate::adapters::http::chat::dto::{ConversationView, MessageView};
use crate::domain::foundation::ConversationId;

// ============================================
// Client → Server Events
// ============================================

/// All event types that can be received from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Send a text message into a conversation.
    SendMessage(SendMessagePayload),

    /// Flip the caller's typing flag on a conversation.
    Typing(TypingPayload),

    /// Mark the other party's messages as read.
    MarkAsRead(MarkAsReadPayload),

    /// Subscribe this connection to a conversation room.
    JoinConversation(JoinConversationPayload),
}

/// Payload of a sendMessage event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub conversation_id: ConversationId,
    pub content: String,
}

/// Payload of a typing event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: ConversationId,
    pub is_typing: bool,
}

/// Payload of a markAsRead event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadPayload {
    pub conversation_id: ConversationId,
}

/// Payload of a joinConversation event: the conversation id as a raw
/// string, not an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct JoinConversationPayload {
    pub conversation_id: ConversationId,
}

// ============================================
// Server → Client Events
// ============================================

/// All event types that can be sent to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A message arrived in a conversation the client has joined.
    NewMessage(MessageNotice),

    /// A conversation's snapshot changed (new last message).
    ConversationUpdated(ConversationNotice),

    /// The other party's typing flag changed.
    UserTyping(TypingNotice),

    /// The other party read the caller's messages.
    MessagesRead(ReadNotice),

    /// Per-event acknowledgement, sent only to the originating connection.
    Ack(AckPayload),
}

/// A persisted message, delivered to the conversation room with its
/// conversation id alongside.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotice {
    pub conversation_id: String,
    pub message: MessageView,
}

/// Refreshed conversation snapshot, delivered to both parties' user rooms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationNotice {
    pub conversation: ConversationView,
}

/// Typing state change, delivered to the conversation room minus the
/// typist's own connections.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub conversation_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

/// Read receipt, delivered to the other party's user room only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadNotice {
    pub conversation_id: String,
    pub read_by: String,
}

/// Acknowledgement payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckPayload {
    /// Positive ack with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    /// Positive ack carrying the persisted message.
    pub fn with_message(message: MessageView) -> Self {
        Self {
            success: true,
            message: Some(message),
            error: None,
        }
    }

    /// Negative ack with an error description.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}
