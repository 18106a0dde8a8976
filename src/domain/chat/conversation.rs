//! Conversation aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, ListingId, Timestamp, UserId};

/// Which side of a conversation a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Buyer,
    Seller,
}

/// A conversation between a prospective buyer and a listing's seller.
///
/// At most one conversation exists per (buyer, seller, listing) triple and
/// its two parties are fixed for its lifetime. Created lazily on first
/// contact; never deleted by this service.
///
/// The two typing flags are the only mutable non-append-only state in the
/// model. They are last-writer-wins and carry no auto-expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub listing_id: ListingId,
    /// Denormalized snapshot of the most recent message, for list views.
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub is_buyer_typing: bool,
    pub is_seller_typing: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    /// Opens a new conversation for a (buyer, seller, listing) triple.
    pub fn open(buyer_id: UserId, seller_id: UserId, listing_id: ListingId) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            buyer_id,
            seller_id,
            listing_id,
            last_message: None,
            last_message_at: None,
            is_buyer_typing: false,
            is_seller_typing: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns which party the user is, if they are one at all.
    pub fn party_of(&self, user_id: &UserId) -> Option<Party> {
        if *user_id == self.buyer_id {
            Some(Party::Buyer)
        } else if *user_id == self.seller_id {
            Some(Party::Seller)
        } else {
            None
        }
    }

    /// True if the user is the buyer or the seller.
    pub fn is_party(&self, user_id: &UserId) -> bool {
        self.party_of(user_id).is_some()
    }

    /// Returns the other party's id, if the given user is a party.
    pub fn other_party_id(&self, user_id: &UserId) -> Option<&UserId> {
        match self.party_of(user_id)? {
            Party::Buyer => Some(&self.seller_id),
            Party::Seller => Some(&self.buyer_id),
        }
    }

    /// Records a new message into the last-message snapshot.
    pub fn record_message(&mut self, content: &str, at: Timestamp) {
        self.last_message = Some(content.to_string());
        self.last_message_at = Some(at);
        self.updated_at = at;
    }

    /// Sets exactly one party's typing flag, leaving the other untouched.
    pub fn set_typing(&mut self, party: Party, is_typing: bool) {
        match party {
            Party::Buyer => self.is_buyer_typing = is_typing,
            Party::Seller => self.is_seller_typing = is_typing,
        }
        self.updated_at = Timestamp::now();
    }
}
