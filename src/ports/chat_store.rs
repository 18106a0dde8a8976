//! Conversation Store port.
//!
//! The single source of truth for conversations and messages, and the sole
//! arbiter of write ordering for conflicting updates to the same
//! conversation row (typing flags and last-message snapshot are
//! last-writer-wins by design).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::chat::{ChatError, Conversation, Message, Party};
use crate::domain::foundation::{ConversationId, ListingId, Timestamp, UserId};

use super::listing_reader::ListingSummary;

/// Errors from the conversation store.
#[derive(Debug, Error)]
pub enum ChatStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    /// The (buyer, seller, listing) uniqueness constraint rejected an
    /// insert; a concurrent first contact got there first.
    #[error("Conversation already exists for these parties")]
    AlreadyExists,
}

impl From<ChatStoreError> for ChatError {
    fn from(err: ChatStoreError) -> Self {
        match err {
            ChatStoreError::NotFound(id) => ChatError::ConversationNotFound(id),
            other => ChatError::Store(other.to_string()),
        }
    }
}

/// Denormalized user summary for list rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: Option<String>,
}

impl UserSummary {
    /// Summary for a user the directory has no profile row for.
    pub fn bare(id: UserId) -> Self {
        Self {
            id,
            display_name: None,
        }
    }
}

/// A conversation together with the denormalized buyer/seller/listing
/// summaries that list views need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationOverview {
    pub conversation: Conversation,
    pub buyer: UserSummary,
    pub seller: UserSummary,
    pub listing: ListingSummary,
}

/// Port for conversation and message persistence.
///
/// Every mutating chat operation is read → authorize → write against this
/// store; fan-out happens only after the write succeeds.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch a conversation by id.
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ChatStoreError>;

    /// Fetch the conversation for a (buyer, seller, listing) triple.
    ///
    /// The store enforces a uniqueness constraint on the triple, so at most
    /// one row can match.
    async fn find_by_parties(
        &self,
        buyer_id: &UserId,
        seller_id: &UserId,
        listing_id: &ListingId,
    ) -> Result<Option<Conversation>, ChatStoreError>;

    /// Persist a newly opened conversation.
    ///
    /// Returns `AlreadyExists` when a row for the same (buyer, seller,
    /// listing) triple is already present.
    async fn insert_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), ChatStoreError>;

    /// Persist a new message row.
    async fn insert_message(&self, message: &Message) -> Result<(), ChatStoreError>;

    /// Update the conversation's last-message snapshot.
    async fn touch_last_message(
        &self,
        id: &ConversationId,
        content: &str,
        at: Timestamp,
    ) -> Result<(), ChatStoreError>;

    /// Set one party's typing flag.
    async fn set_typing_flag(
        &self,
        id: &ConversationId,
        party: Party,
        is_typing: bool,
    ) -> Result<(), ChatStoreError>;

    /// Flip `is_read` to true for every unread message in the conversation
    /// authored by `sender_id`. Returns how many rows changed; idempotent.
    async fn mark_read_from(
        &self,
        id: &ConversationId,
        sender_id: &UserId,
    ) -> Result<u64, ChatStoreError>;

    /// All messages of a conversation, oldest first.
    async fn messages_for(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<Message>, ChatStoreError>;

    /// A window of messages plus the total count.
    ///
    /// The window is offset from the most recent message but returned
    /// oldest-first, matching how chat history is rendered.
    async fn messages_page(
        &self,
        id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Message>, u32), ChatStoreError>;

    /// Every conversation where the user is buyer or seller, most recent
    /// message first.
    async fn conversations_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationOverview>, ChatStoreError>;

    /// Ids of every conversation the user participates in.
    ///
    /// Used by the connection manager to snapshot room subscriptions at
    /// connect time.
    async fn conversation_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, ChatStoreError>;

    /// One conversation with its denormalized summaries.
    async fn overview(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationOverview>, ChatStoreError>;

    /// Total unread messages addressed to the user across all of their
    /// conversations.
    async fn unread_count_for_user(&self, user_id: &UserId) -> Result<u64, ChatStoreError>;
}
