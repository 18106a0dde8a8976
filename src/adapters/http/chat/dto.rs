//! HTTP DTOs for chat endpoints.
//!
//! These views decouple the wire format from domain types. The realtime
//! gateway reuses the same views, so REST and socket clients render
//! identical JSON for conversations and messages.

use serde::{Deserialize, Serialize};

use crate::application::chat::ConversationWithMessages;
use crate::domain::chat::{Message, MessageKind};
use crate::ports::{ConversationOverview, ListingSummary, UserSummary};

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// View of a message for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub is_read: bool,
    pub created_at: String,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            sender_id: message.sender_id.to_string(),
            content: message.content.clone(),
            kind: message.kind,
            is_read: message.is_read,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Denormalized user summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<&UserSummary> for UserSummaryView {
    fn from(summary: &UserSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            display_name: summary.display_name.clone(),
        }
    }
}

/// Denormalized listing summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

impl From<&ListingSummary> for ListingView {
    fn from(listing: &ListingSummary) -> Self {
        Self {
            id: listing.id.to_string(),
            seller_id: listing.seller_id.to_string(),
            title: listing.title.clone(),
            price: listing.price,
        }
    }
}

/// View of a conversation with its denormalized summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub buyer: UserSummaryView,
    pub seller: UserSummaryView,
    pub listing: ListingView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<String>,
    pub is_buyer_typing: bool,
    pub is_seller_typing: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ConversationOverview> for ConversationView {
    fn from(overview: &ConversationOverview) -> Self {
        let c = &overview.conversation;
        Self {
            id: c.id.to_string(),
            buyer: (&overview.buyer).into(),
            seller: (&overview.seller).into(),
            listing: (&overview.listing).into(),
            last_message: c.last_message.clone(),
            last_message_at: c.last_message_at.map(|t| t.to_rfc3339()),
            is_buyer_typing: c.is_buyer_typing,
            is_seller_typing: c.is_seller_typing,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// A conversation plus its ordered message history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationWithMessagesView {
    pub conversation: ConversationView,
    pub messages: Vec<MessageView>,
}

impl From<&ConversationWithMessages> for ConversationWithMessagesView {
    fn from(value: &ConversationWithMessages) -> Self {
        Self {
            conversation: (&value.overview).into(),
            messages: value.messages.iter().map(MessageView::from).collect(),
        }
    }
}

/// Total unread count across all of a user's conversations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountView {
    pub unread_count: u64,
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a new page from items.
    pub fn new(items: Vec<T>, total: u32, offset: u32, limit: u32) -> Self {
        let has_more = (offset + items.len() as u32) < total;
        Self {
            items,
            total,
            offset,
            limit,
            has_more,
        }
    }
}

/// Error body returned by chat endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Message kinds a client may submit.
///
/// `system` is deliberately absent: system messages are synthesized
/// server-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMessageKind {
    Text,
    Image,
}

impl From<ClientMessageKind> for MessageKind {
    fn from(kind: ClientMessageKind) -> Self {
        match kind {
            ClientMessageKind::Text => MessageKind::Text,
            ClientMessageKind::Image => MessageKind::Image,
        }
    }
}

/// Body of POST .../messages.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: Option<ClientMessageKind>,
}

/// Query parameters for paginated message retrieval.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Default limit for messages.
    pub const DEFAULT_LIMIT: u32 = 50;
    /// Maximum allowed limit.
    pub const MAX_LIMIT: u32 = 100;

    /// Get the effective offset.
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Get the effective limit, capped at MAX_LIMIT.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}
