//! Chat domain error taxonomy.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, ListingId};

/// Errors surfaced by chat operations.
///
/// Validation and authorization failures are recovered at the router
/// boundary and returned to the originating caller only; they are never
/// broadcast to other room members.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// Referenced listing does not exist.
    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    /// Referenced conversation does not exist.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// A seller attempted to open a conversation on their own listing.
    #[error("Cannot start a conversation with yourself")]
    SelfConversation,

    /// Actor is neither the buyer nor the seller of the conversation.
    #[error("Not authorized to access this conversation")]
    NotParticipant,

    /// The backing store failed; the corresponding broadcast is aborted.
    #[error("Storage error: {0}")]
    Store(String),
}

impl ChatError {
    /// True for failures caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ChatError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_distinguished_from_store_errors() {
        assert!(ChatError::SelfConversation.is_client_error());
        assert!(ChatError::NotParticipant.is_client_error());
        assert!(!ChatError::Store("boom".into()).is_client_error());
    }

    #[test]
    fn self_conversation_message_matches_api_contract() {
        assert_eq!(
            ChatError::SelfConversation.to_string(),
            "Cannot start a conversation with yourself"
        );
    }
}
