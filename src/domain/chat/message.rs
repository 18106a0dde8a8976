//! Chat message types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};

/// Kind of a chat message.
///
/// A closed set: all observed behavior only ever branches on these three
/// values, so this is a tagged variant rather than an open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    System,
}

impl MessageKind {
    /// Storage representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::System => "system",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageKind::Text),
            "image" => Some(MessageKind::Image),
            "system" => Some(MessageKind::System),
            _ => None,
        }
    }
}

/// A single message within a conversation.
///
/// The sender must be one of the owning conversation's two parties; the
/// message router enforces this before persistence. The read flag only
/// transitions false→true, via mark-as-read invoked by the other party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub kind: MessageKind,
    pub is_read: bool,
    pub created_at: Timestamp,
}

impl Message {
    /// Creates a new unread message of the given kind.
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            content: content.into(),
            kind,
            is_read: false,
            created_at: Timestamp::now(),
        }
    }

    /// Creates a plain text message.
    pub fn text(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self::new(conversation_id, sender_id, content, MessageKind::Text)
    }

    /// Creates a system message attributed to the given party.
    pub fn system(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self::new(conversation_id, sender_id, content, MessageKind::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_messages_start_unread() {
        let msg = Message::text(
            ConversationId::new(),
            UserId::new("buyer-1").unwrap(),
            "hello",
        );
        assert!(!msg.is_read);
        assert_eq!(msg.kind, MessageKind::Text);
    }

    #[test]
    fn kind_round_trips_through_storage_form() {
        for kind in [MessageKind::Text, MessageKind::Image, MessageKind::System] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("video"), None);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageKind::System).unwrap(),
            "\"system\""
        );
    }
}
