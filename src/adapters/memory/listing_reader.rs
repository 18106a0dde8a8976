//! In-memory listing catalogue.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::ListingId;
use crate::ports::{ListingReader, ListingReaderError, ListingSummary};

/// In-memory implementation of `ListingReader`.
#[derive(Default)]
pub struct InMemoryListingReader {
    listings: RwLock<HashMap<ListingId, ListingSummary>>,
}

impl InMemoryListingReader {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a listing.
    pub async fn insert(&self, listing: ListingSummary) {
        self.listings.write().await.insert(listing.id, listing);
    }
}

#[async_trait]
impl ListingReader for InMemoryListingReader {
    async fn find_by_id(
        &self,
        id: &ListingId,
    ) -> Result<Option<ListingSummary>, ListingReaderError> {
        Ok(self.listings.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn finds_inserted_listing() {
        let reader = InMemoryListingReader::new();
        let id = ListingId::new();
        reader
            .insert(ListingSummary {
                id,
                seller_id: UserId::new("seller-1").unwrap(),
                title: "2014 Golf GTI".to_string(),
                price: Some(1_250_000),
            })
            .await;

        let found = reader.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.title, "2014 Golf GTI");
        assert!(reader
            .find_by_id(&ListingId::new())
            .await
            .unwrap()
            .is_none());
    }
}
