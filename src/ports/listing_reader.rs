//! Read-only access to the listing catalogue.
//!
//! Listings are owned by the marketplace backend; the chat core only needs
//! enough of a listing to authorize first contact and to render list views.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::chat::ChatError;
use crate::domain::foundation::{ListingId, UserId};

/// Denormalized listing summary for chat views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub seller_id: UserId,
    pub title: String,
    /// Asking price in minor currency units, if set.
    pub price: Option<i64>,
}

/// Errors from the listing catalogue.
#[derive(Debug, Error)]
pub enum ListingReaderError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<ListingReaderError> for ChatError {
    fn from(err: ListingReaderError) -> Self {
        ChatError::Store(err.to_string())
    }
}

/// Port for reading listings.
#[async_trait]
pub trait ListingReader: Send + Sync {
    /// Fetch a listing summary by id, or `None` if it does not exist.
    async fn find_by_id(&self, id: &ListingId)
        -> Result<Option<ListingSummary>, ListingReaderError>;
}
