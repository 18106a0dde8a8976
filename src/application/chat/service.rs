//! ChatService: validate → persist for every chat action.
//!
//! This is the message router's core. It holds no connection state and
//! issues no broadcasts; the realtime gateway layers fan-out on top, and
//! only after an operation here has succeeded. The REST adapter calls the
//! same operations without any fan-out.

use std::sync::Arc;

use crate::domain::chat::{ChatError, Conversation, Message, MessageKind, Party};
use crate::domain::foundation::{ConversationId, ListingId, UserId};
use crate::ports::{ChatStore, ChatStoreError, ConversationOverview, ListingReader};

/// A conversation with its denormalized summaries and full ordered history.
#[derive(Debug, Clone)]
pub struct ConversationWithMessages {
    pub overview: ConversationOverview,
    /// Oldest first.
    pub messages: Vec<Message>,
}

/// Result of a mark-as-read call.
#[derive(Debug, Clone)]
pub struct MarkReadOutcome {
    /// How many messages flipped to read. Zero on repeat invocations.
    pub updated: u64,
    /// The party whose messages were read; they get the `messagesRead`
    /// notification on the realtime path.
    pub other_party: UserId,
}

/// Chat use-case service.
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    listings: Arc<dyn ListingReader>,
}

impl ChatService {
    /// Creates a new ChatService over the given ports.
    pub fn new(store: Arc<dyn ChatStore>, listings: Arc<dyn ListingReader>) -> Self {
        Self { store, listings }
    }

    /// Start (or resume) a conversation between `initiator` and the seller
    /// of `listing_id`.
    ///
    /// Idempotent per (buyer, seller, listing) triple: the first call
    /// creates the conversation and a seller-attributed system welcome
    /// message carrying the listing title; subsequent calls return the
    /// existing conversation with its history.
    pub async fn start_conversation(
        &self,
        initiator: &UserId,
        listing_id: &ListingId,
    ) -> Result<ConversationWithMessages, ChatError> {
        let listing = self
            .listings
            .find_by_id(listing_id)
            .await?
            .ok_or(ChatError::ListingNotFound(*listing_id))?;

        if listing.seller_id == *initiator {
            return Err(ChatError::SelfConversation);
        }

        let conversation = match self
            .store
            .find_by_parties(initiator, &listing.seller_id, listing_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                let conversation = Conversation::open(
                    initiator.clone(),
                    listing.seller_id.clone(),
                    *listing_id,
                );
                match self.store.insert_conversation(&conversation).await {
                    Ok(()) => {
                        tracing::debug!(
                            conversation_id = %conversation.id,
                            listing_id = %listing_id,
                            "opened conversation"
                        );

                        // Welcome message goes through the ordinary send
                        // path so it also sets the last-message snapshot.
                        self.send_message(
                            &listing.seller_id,
                            &conversation.id,
                            format!("Hello! I'm interested in your listing: {}", listing.title),
                            MessageKind::System,
                        )
                        .await?;

                        conversation
                    }
                    // Lost a concurrent first-contact race; the winner's
                    // row (and its welcome message) is authoritative.
                    Err(ChatStoreError::AlreadyExists) => self
                        .store
                        .find_by_parties(initiator, &listing.seller_id, listing_id)
                        .await?
                        .ok_or_else(|| {
                            ChatError::Store(
                                "conversation missing after conflicting insert".to_string(),
                            )
                        })?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        self.conversation_with_messages(&conversation.id).await
    }

    /// Persist a message and refresh the conversation's last-message
    /// snapshot. The sender must be a party to the conversation.
    pub async fn send_message(
        &self,
        sender_id: &UserId,
        conversation_id: &ConversationId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Result<Message, ChatError> {
        let conversation = self.require_conversation(conversation_id).await?;

        if !conversation.is_party(sender_id) {
            return Err(ChatError::NotParticipant);
        }

        let message = Message::new(*conversation_id, sender_id.clone(), content, kind);
        self.store.insert_message(&message).await?;
        self.store
            .touch_last_message(conversation_id, &message.content, message.created_at)
            .await?;

        Ok(message)
    }

    /// Set the caller's typing flag on the conversation.
    ///
    /// Flags are last-writer-wins and stay set until explicitly cleared;
    /// there is no timeout-based auto-clear.
    pub async fn update_typing_status(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
        is_typing: bool,
    ) -> Result<Party, ChatError> {
        let conversation = self.require_conversation(conversation_id).await?;

        let party = conversation
            .party_of(user_id)
            .ok_or(ChatError::NotParticipant)?;

        self.store
            .set_typing_flag(conversation_id, party, is_typing)
            .await?;

        Ok(party)
    }

    /// Mark every unread message authored by the other party as read.
    /// Idempotent: re-invocation changes nothing further.
    pub async fn mark_messages_read(
        &self,
        conversation_id: &ConversationId,
        reader_id: &UserId,
    ) -> Result<MarkReadOutcome, ChatError> {
        let conversation = self.require_conversation(conversation_id).await?;

        let other_party = conversation
            .other_party_id(reader_id)
            .ok_or(ChatError::NotParticipant)?
            .clone();

        let updated = self
            .store
            .mark_read_from(conversation_id, &other_party)
            .await?;

        Ok(MarkReadOutcome {
            updated,
            other_party,
        })
    }

    /// Every conversation the user participates in, most recent first.
    pub async fn user_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationOverview>, ChatError> {
        Ok(self.store.conversations_for_user(user_id).await?)
    }

    /// Conversation ids for the connect-time room snapshot.
    pub async fn conversation_ids(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, ChatError> {
        Ok(self.store.conversation_ids_for_user(user_id).await?)
    }

    /// One conversation with summaries, or `ConversationNotFound`.
    pub async fn conversation_overview(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ConversationOverview, ChatError> {
        self.store
            .overview(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(*conversation_id))
    }

    /// One conversation plus its full message history, oldest first.
    pub async fn conversation_with_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ConversationWithMessages, ChatError> {
        let overview = self.conversation_overview(conversation_id).await?;
        let messages = self.store.messages_for(conversation_id).await?;
        Ok(ConversationWithMessages { overview, messages })
    }

    /// A window of message history plus the total count.
    pub async fn messages_page(
        &self,
        conversation_id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Message>, u32), ChatError> {
        self.require_conversation(conversation_id).await?;
        Ok(self
            .store
            .messages_page(conversation_id, offset, limit)
            .await?)
    }

    /// Total unread messages addressed to the user.
    pub async fn unread_count(&self, user_id: &UserId) -> Result<u64, ChatError> {
        Ok(self.store.unread_count_for_user(user_id).await?)
    }

    async fn require_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, ChatError> {
        self.store
            .find_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(*conversation_id))
    }
}
