//! PostgreSQL implementation of ChatStore.
//!
//! Conversations and messages live in `chat_conversations` and
//! `chat_messages` (see `migrations/`). Overviews join the externally owned
//! `users` and `listings` tables for list rendering.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::chat::{Conversation, Message, MessageKind, Party};
use crate::domain::foundation::{
    ConversationId, ListingId, MessageId, Timestamp, UserId,
};
use crate::ports::{
    ChatStore, ChatStoreError, ConversationOverview, ListingSummary, UserSummary,
};

/// PostgreSQL implementation of ChatStore.
#[derive(Clone)]
pub struct PostgresChatStore {
    pool: PgPool,
}

impl PostgresChatStore {
    /// Creates a new PostgresChatStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_id_from_row(row: &PgRow, column: &str) -> Result<UserId, ChatStoreError> {
    let raw: String = row.get(column);
    UserId::new(raw)
        .map_err(|e| ChatStoreError::Database(format!("Invalid {} in row: {}", column, e)))
}

fn conversation_from_row(row: &PgRow) -> Result<Conversation, ChatStoreError> {
    let last_message_at: Option<DateTime<Utc>> = row.get("last_message_at");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(Conversation {
        id: ConversationId::from_uuid(row.get("id")),
        buyer_id: user_id_from_row(row, "buyer_id")?,
        seller_id: user_id_from_row(row, "seller_id")?,
        listing_id: ListingId::from_uuid(row.get("listing_id")),
        last_message: row.get("last_message"),
        last_message_at: last_message_at.map(Timestamp::from_datetime),
        is_buyer_typing: row.get("is_buyer_typing"),
        is_seller_typing: row.get("is_seller_typing"),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, ChatStoreError> {
    let kind: String = row.get("message_type");
    let kind = MessageKind::parse(&kind)
        .ok_or_else(|| ChatStoreError::Database(format!("Unknown message type: {}", kind)))?;
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(Message {
        id: MessageId::from_uuid(row.get("id")),
        conversation_id: ConversationId::from_uuid(row.get("conversation_id")),
        sender_id: user_id_from_row(row, "sender_id")?,
        content: row.get("content"),
        kind,
        is_read: row.get("is_read"),
        created_at: Timestamp::from_datetime(created_at),
    })
}

fn overview_from_row(row: &PgRow) -> Result<ConversationOverview, ChatStoreError> {
    let conversation = conversation_from_row(row)?;

    let buyer = UserSummary {
        id: conversation.buyer_id.clone(),
        display_name: row.get("buyer_display_name"),
    };
    let seller = UserSummary {
        id: conversation.seller_id.clone(),
        display_name: row.get("seller_display_name"),
    };
    let listing = ListingSummary {
        id: conversation.listing_id,
        seller_id: conversation.seller_id.clone(),
        title: row
            .get::<Option<String>, _>("listing_title")
            .unwrap_or_default(),
        price: row.get("listing_price"),
    };

    Ok(ConversationOverview {
        conversation,
        buyer,
        seller,
        listing,
    })
}

const OVERVIEW_SELECT: &str = r#"
    SELECT c.id, c.buyer_id, c.seller_id, c.listing_id,
           c.last_message, c.last_message_at,
           c.is_buyer_typing, c.is_seller_typing,
           c.created_at, c.updated_at,
           bu.display_name AS buyer_display_name,
           su.display_name AS seller_display_name,
           l.title AS listing_title,
           l.price AS listing_price
    FROM chat_conversations c
    LEFT JOIN users bu ON bu.id = c.buyer_id
    LEFT JOIN users su ON su.id = c.seller_id
    LEFT JOIN listings l ON l.id = c.listing_id
"#;

#[async_trait]
impl ChatStore for PostgresChatStore {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ChatStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, listing_id, last_message,
                   last_message_at, is_buyer_typing, is_seller_typing,
                   created_at, updated_at
            FROM chat_conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to fetch conversation: {}", e)))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn find_by_parties(
        &self,
        buyer_id: &UserId,
        seller_id: &UserId,
        listing_id: &ListingId,
    ) -> Result<Option<Conversation>, ChatStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, listing_id, last_message,
                   last_message_at, is_buyer_typing, is_seller_typing,
                   created_at, updated_at
            FROM chat_conversations
            WHERE buyer_id = $1 AND seller_id = $2 AND listing_id = $3
            "#,
        )
        .bind(buyer_id.as_str())
        .bind(seller_id.as_str())
        .bind(listing_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to fetch conversation: {}", e)))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn insert_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), ChatStoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_conversations (
                id, buyer_id, seller_id, listing_id, last_message,
                last_message_at, is_buyer_typing, is_seller_typing,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.buyer_id.as_str())
        .bind(conversation.seller_id.as_str())
        .bind(conversation.listing_id.as_uuid())
        .bind(&conversation.last_message)
        .bind(conversation.last_message_at.map(|t| *t.as_datetime()))
        .bind(conversation.is_buyer_typing)
        .bind(conversation.is_seller_typing)
        .bind(conversation.created_at.as_datetime())
        .bind(conversation.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                ChatStoreError::AlreadyExists
            } else {
                ChatStoreError::Database(format!("Failed to insert conversation: {}", e))
            }
        })?;

        Ok(())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), ChatStoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (
                id, conversation_id, sender_id, content, message_type,
                is_read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.sender_id.as_str())
        .bind(&message.content)
        .bind(message.kind.as_str())
        .bind(message.is_read)
        .bind(message.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    async fn touch_last_message(
        &self,
        id: &ConversationId,
        content: &str,
        at: Timestamp,
    ) -> Result<(), ChatStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_conversations
            SET last_message = $2, last_message_at = $3, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(content)
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to update conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(ChatStoreError::NotFound(*id));
        }
        Ok(())
    }

    async fn set_typing_flag(
        &self,
        id: &ConversationId,
        party: Party,
        is_typing: bool,
    ) -> Result<(), ChatStoreError> {
        let column = match party {
            Party::Buyer => "is_buyer_typing",
            Party::Seller => "is_seller_typing",
        };
        let query = format!(
            "UPDATE chat_conversations SET {} = $2, updated_at = NOW() WHERE id = $1",
            column
        );

        let result = sqlx::query(&query)
            .bind(id.as_uuid())
            .bind(is_typing)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                ChatStoreError::Database(format!("Failed to update typing flag: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(ChatStoreError::NotFound(*id));
        }
        Ok(())
    }

    async fn mark_read_from(
        &self,
        id: &ConversationId,
        sender_id: &UserId,
    ) -> Result<u64, ChatStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_messages
            SET is_read = TRUE
            WHERE conversation_id = $1 AND sender_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(sender_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to mark messages read: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn messages_for(&self, id: &ConversationId) -> Result<Vec<Message>, ChatStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, message_type,
                   is_read, created_at
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to fetch messages: {}", e)))?;

        rows.iter().map(message_from_row).collect()
    }

    async fn messages_page(
        &self,
        id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Message>, u32), ChatStoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_messages WHERE conversation_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to count messages: {}", e)))?;

        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, message_type,
                   is_read, created_at
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to fetch messages: {}", e)))?;

        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        // Fetched newest-first for the window; display order is oldest-first.
        messages.reverse();

        Ok((messages, total as u32))
    }

    async fn conversations_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationOverview>, ChatStoreError> {
        let query = format!(
            "{} WHERE c.buyer_id = $1 OR c.seller_id = $1 \
             ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC",
            OVERVIEW_SELECT
        );

        let rows = sqlx::query(&query)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                ChatStoreError::Database(format!("Failed to fetch conversations: {}", e))
            })?;

        rows.iter().map(overview_from_row).collect()
    }

    async fn conversation_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationId>, ChatStoreError> {
        let rows = sqlx::query(
            "SELECT id FROM chat_conversations WHERE buyer_id = $1 OR seller_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            ChatStoreError::Database(format!("Failed to fetch conversation ids: {}", e))
        })?;

        Ok(rows
            .iter()
            .map(|row| ConversationId::from_uuid(row.get("id")))
            .collect())
    }

    async fn overview(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationOverview>, ChatStoreError> {
        let query = format!("{} WHERE c.id = $1", OVERVIEW_SELECT);

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                ChatStoreError::Database(format!("Failed to fetch conversation: {}", e))
            })?;

        row.as_ref().map(overview_from_row).transpose()
    }

    async fn unread_count_for_user(&self, user_id: &UserId) -> Result<u64, ChatStoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM chat_messages m
            JOIN chat_conversations c ON c.id = m.conversation_id
            WHERE (c.buyer_id = $1 OR c.seller_id = $1)
              AND m.sender_id <> $1
              AND m.is_read = FALSE
            "#,
        )
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ChatStoreError::Database(format!("Failed to count unread: {}", e)))?;

        Ok(count as u64)
    }
}
