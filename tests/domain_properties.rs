//! Property tests for conversation domain invariants.

use proptest::prelude::*;

use motorline_chat::domain::chat::{Conversation, Party};
use motorline_chat::domain::foundation::{ListingId, Timestamp, UserId};

fn user_id() -> impl Strategy<Value = UserId> {
    "[a-z0-9]{1,12}".prop_map(|s| UserId::new(s).unwrap())
}

fn distinct_parties() -> impl Strategy<Value = (UserId, UserId)> {
    (user_id(), user_id()).prop_filter("parties must differ", |(a, b)| a != b)
}

proptest! {
    /// Exactly the two parties resolve to a role, and each to the other's
    /// counterpart.
    #[test]
    fn party_resolution_is_total_over_parties((buyer, seller) in distinct_parties(), other in user_id()) {
        let conversation = Conversation::open(buyer.clone(), seller.clone(), ListingId::new());

        prop_assert_eq!(conversation.party_of(&buyer), Some(Party::Buyer));
        prop_assert_eq!(conversation.party_of(&seller), Some(Party::Seller));
        prop_assert_eq!(conversation.other_party_id(&buyer), Some(&seller));
        prop_assert_eq!(conversation.other_party_id(&seller), Some(&buyer));

        if other != buyer && other != seller {
            prop_assert_eq!(conversation.party_of(&other), None);
            prop_assert!(!conversation.is_party(&other));
            prop_assert_eq!(conversation.other_party_id(&other), None);
        }
    }

    /// Any sequence of typing updates leaves each flag equal to the last
    /// write for that party, independent of the other's writes.
    #[test]
    fn typing_flags_follow_last_write(
        (buyer, seller) in distinct_parties(),
        ops in prop::collection::vec((prop::bool::ANY, prop::bool::ANY), 1..20),
    ) {
        let mut conversation = Conversation::open(buyer, seller, ListingId::new());
        let mut last_buyer = false;
        let mut last_seller = false;

        for (is_buyer, is_typing) in ops {
            let party = if is_buyer { Party::Buyer } else { Party::Seller };
            conversation.set_typing(party, is_typing);
            if is_buyer {
                last_buyer = is_typing;
            } else {
                last_seller = is_typing;
            }
        }

        prop_assert_eq!(conversation.is_buyer_typing, last_buyer);
        prop_assert_eq!(conversation.is_seller_typing, last_seller);
    }

    /// The snapshot always reflects the latest recorded message.
    #[test]
    fn snapshot_tracks_latest_message(
        (buyer, seller) in distinct_parties(),
        contents in prop::collection::vec("[ -~]{1,40}", 1..10),
    ) {
        let mut conversation = Conversation::open(buyer, seller, ListingId::new());

        for content in &contents {
            conversation.record_message(content, Timestamp::now());
        }

        prop_assert_eq!(
            conversation.last_message.as_deref(),
            contents.last().map(|s| s.as_str())
        );
        prop_assert!(conversation.last_message_at.is_some());
    }
}
