//! In-memory conversation store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::{Conversation, Message, Party};
use crate::domain::foundation::{ConversationId, ListingId, Timestamp, UserId};
use crate::ports::{
    ChatStore, ChatStoreError, ConversationOverview, ListingReader, ListingSummary, UserSummary,
};

use super::InMemoryListingReader;

#[derive(Default)]
struct State {
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<Message>,
    profiles: HashMap<UserId, UserSummary>,
}

/// In-memory implementation of `ChatStore`.
///
/// Shares a listing catalogue with the service under test so overviews can
/// denormalize listing summaries the way the SQL adapter's joins do.
pub struct InMemoryChatStore {
    state: RwLock<State>,
    listings: Arc<InMemoryListingReader>,
}

impl InMemoryChatStore {
    /// Creates an empty store over the given catalogue.
    pub fn new(listings: Arc<InMemoryListingReader>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            listings,
        }
    }

    /// Registers a display name for overview rendering.
    pub async fn set_display_name(&self, user_id: UserId, display_name: impl Into<String>) {
        let summary = UserSummary {
            id: user_id.clone(),
            display_name: Some(display_name.into()),
        };
        self.state.write().await.profiles.insert(user_id, summary);
    }

    async fn build_overview(
        &self,
        state: &State,
        conversation: &Conversation,
    ) -> ConversationOverview {
        let profile = |id: &UserId| {
            state
                .profiles
                .get(id)
                .cloned()
                .unwrap_or_else(|| UserSummary::bare(id.clone()))
        };

        let listing = self
            .listings
            .find_by_id(&conversation.listing_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| ListingSummary {
                id: conversation.listing_id,
                seller_id: conversation.seller_id.clone(),
                title: String::new(),
                price: None,
            });

        ConversationOverview {
            conversation: conversation.clone(),
            buyer: profile(&conversation.buyer_id),
            seller: profile(&conversation.seller_id),
            listing,
        }
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ChatStoreError> {
        Ok(self.state.read().await.conversations.get(id).cloned())
    }

    async fn find_by_parties(
        &self,
        buyer_id: &UserId,
        seller_id: &UserId,
        listing_id: &ListingId,
    ) -> Result<Option<Conversation>, ChatStoreError> {
        Ok(self
            .state
            .read()
            .await
            .conversations
            .values()
            .find(|c| {
                c.buyer_id == *buyer_id
                    && c.seller_id == *seller_id
                    && c.listing_id == *listing_id
            })
            .cloned())
    }

    async fn insert_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), ChatStoreError> {
        let mut state = self.state.write().await;
        let duplicate = state.conversations.values().any(|c| {
            c.buyer_id == conversation.buyer_id
                && c.seller_id == conversation.seller_id
                && c.listing_id == conversation.listing_id
        });
        if duplicate {
            return Err(ChatStoreError::AlreadyExists);
        }
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), ChatStoreError> {
        let mut state = self.state.write().await;
        if !state.conversations.contains_key(&message.conversation_id) {
            return Err(ChatStoreError::NotFound(message.conversation_id));
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn touch_last_message(
        &self,
        id: &ConversationId,
        content: &str,
        at: Timestamp,
    ) -> Result<(), ChatStoreError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or(ChatStoreError::NotFound(*id))?;
        conversation.record_message(content, at);
        Ok(())
    }

    async fn set_typing_flag(
        &self,
        id: &ConversationId,
        party: Party,
        is_typing: bool,
    ) -> Result<(), ChatStoreError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or(ChatStoreError::NotFound(*id))?;
        conversation.set_typing(party, is_typing);
        Ok(())
    }

    async fn mark_read_from(
        &self,
        id: &ConversationId,
        sender_id: &UserId,
    ) -> Result<u64, ChatStoreError> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == *id && m.sender_id == *sender_id && !m.is_read)
        {
            message.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn messages_for(&self, id: &ConversationId) -> Result<Vec<Message>, ChatStoreError> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn messages_page(
        &self,
        id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Message>, u32), ChatStoreError> {
        let all = self.messages_for(id).await?;
        let total = all.len() as u32;

        // Window counted from the newest message, returned oldest-first.
        let end = (total.saturating_sub(offset)) as usize;
        let start = end.saturating_sub(limit as usize);
        Ok((all[start..end].to_vec(), total))
    }

    async fn conversations_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationOverview>, ChatStoreError> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.is_party(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.created_at.cmp(&a.created_at))
        });

        let mut overviews = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            overviews.push(self.build_overview(&state, conversation).await);
        }
        Ok(overviews)
    }

    async fn conversation_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, ChatStoreError> {
        Ok(self
            .state
            .read()
            .await
            .conversations
            .values()
            .filter(|c| c.is_party(user_id))
            .map(|c| c.id)
            .collect())
    }

    async fn overview(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationOverview>, ChatStoreError> {
        let state = self.state.read().await;
        match state.conversations.get(id) {
            Some(conversation) => Ok(Some(self.build_overview(&state, conversation).await)),
            None => Ok(None),
        }
    }

    async fn unread_count_for_user(&self, user_id: &UserId) -> Result<u64, ChatStoreError> {
        let state = self.state.read().await;
        let count = state
            .messages
            .iter()
            .filter(|m| {
                !m.is_read
                    && m.sender_id != *user_id
                    && state
                        .conversations
                        .get(&m.conversation_id)
                        .is_some_and(|c| c.is_party(user_id))
            })
            .count();
        Ok(count as u64)
    }
}
