//! PostgreSQL implementation of ListingReader.
//!
//! The `listings` table is owned by the marketplace backend; this adapter
//! only ever reads it.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ListingId, UserId, ValidationError};
use crate::ports::{ListingReader, ListingReaderError, ListingSummary};

/// PostgreSQL implementation of ListingReader.
#[derive(Clone)]
pub struct PostgresListingReader {
    pool: PgPool,
}

impl PostgresListingReader {
    /// Creates a new PostgresListingReader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingReader for PostgresListingReader {
    async fn find_by_id(
        &self,
        id: &ListingId,
    ) -> Result<Option<ListingSummary>, ListingReaderError> {
        let row = sqlx::query(
            r#"
            SELECT id, seller_id, title, price
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ListingReaderError::Database(format!("Failed to fetch listing: {}", e)))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let seller_id: String = row.get("seller_id");
        let seller_id = UserId::new(seller_id).map_err(|e: ValidationError| {
            ListingReaderError::Database(format!("Invalid seller id in listings row: {}", e))
        })?;

        Ok(Some(ListingSummary {
            id: ListingId::from_uuid(row.get("id")),
            seller_id,
            title: row.get("title"),
            price: row.get("price"),
        }))
    }
}
