//! Integration tests for the realtime gateway's routing rules.
//!
//! Drives the gateway at the dispatch level, with connections simulated
//! as mpsc outboxes, and asserts on which connections observe which
//! events: new messages fan out to the conversation room, snapshot
//! updates to both user rooms, typing to everyone but the typist, read
//! receipts to the other party only, and failures to nobody but the
//! originating connection.

use std::sync::Arc;

use tokio::sync::mpsc;

use motorline_chat::adapters::memory::{InMemoryChatStore, InMemoryListingReader};
use motorline_chat::adapters::websocket::messages::{
    ClientEvent, JoinConversationPayload, MarkAsReadPayload, SendMessagePayload, ServerEvent,
    TypingPayload,
};
use motorline_chat::adapters::websocket::{ChatGateway, InMemoryConnectionRegistry, RoomManager};
use motorline_chat::application::chat::ChatService;
use motorline_chat::domain::foundation::{ConversationId, ListingId, UserId};
use motorline_chat::ports::{ClientId, ConnectionRegistry, ListingSummary};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    gateway: ChatGateway,
    service: Arc<ChatService>,
    registry: Arc<InMemoryConnectionRegistry>,
    listings: Arc<InMemoryListingReader>,
}

fn harness() -> Harness {
    let listings = Arc::new(InMemoryListingReader::new());
    let store = Arc::new(InMemoryChatStore::new(listings.clone()));
    let service = Arc::new(ChatService::new(store, listings.clone()));
    let rooms = Arc::new(RoomManager::new());
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let gateway = ChatGateway::new(service.clone(), rooms, registry.clone());
    Harness {
        gateway,
        service,
        registry,
        listings,
    }
}

struct TestClient {
    user_id: UserId,
    client_id: ClientId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

async fn connect(h: &Harness, user: &str) -> TestClient {
    let user_id = UserId::new(user).unwrap();
    let client_id = ClientId::new();
    let (tx, rx) = mpsc::unbounded_channel();
    h.gateway.connect(&user_id, client_id, tx).await;
    TestClient {
        user_id,
        client_id,
        rx,
    }
}

fn buyer() -> UserId {
    UserId::new("buyer-1").unwrap()
}

fn seller() -> UserId {
    UserId::new("seller-1").unwrap()
}

/// Seeds a listing and opens a conversation, returning its id.
async fn seeded_conversation(h: &Harness) -> ConversationId {
    let listing_id = ListingId::new();
    h.listings
        .insert(ListingSummary {
            id: listing_id,
            seller_id: seller(),
            title: "2014 Golf GTI".to_string(),
            price: Some(1_500_000),
        })
        .await;
    h.service
        .start_conversation(&buyer(), &listing_id)
        .await
        .unwrap()
        .overview
        .conversation
        .id
}

fn send_message(conversation_id: ConversationId, content: &str) -> ClientEvent {
    ClientEvent::SendMessage(SendMessagePayload {
        conversation_id,
        content: content.to_string(),
    })
}

// =============================================================================
// Message fan-out
// =============================================================================

#[tokio::test]
async fn send_message_reaches_both_parties() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    // Both connect after the conversation exists; the connect-time
    // snapshot puts them in its room.
    let mut buyer_client = connect(&h, "buyer-1").await;
    let mut seller_client = connect(&h, "seller-1").await;

    h.gateway
        .dispatch(
            &buyer_client.user_id,
            &buyer_client.client_id,
            send_message(conversation_id, "Is it still available?"),
        )
        .await;

    // Seller: newMessage in the conversation room plus a snapshot update.
    let seller_events = seller_client.drain();
    assert!(seller_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage(n) if n.message.content == "Is it still available?")));
    assert!(seller_events
        .iter()
        .any(|e| matches!(e, ServerEvent::ConversationUpdated(_))));

    // Sender: same broadcasts plus a positive ack carrying the message.
    let buyer_events = buyer_client.drain();
    assert!(buyer_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage(_))));
    assert!(buyer_events.iter().any(|e| matches!(
        e,
        ServerEvent::Ack(ack) if ack.success && ack.message.as_ref().is_some_and(|m| m.content == "Is it still available?")
    )));
}

#[tokio::test]
async fn conversation_updated_reaches_user_rooms_even_off_room() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut buyer_client = connect(&h, "buyer-1").await;
    let mut seller_client = connect(&h, "seller-1").await;

    // A second seller tab that never joined the conversation room would
    // normally miss newMessage; conversationUpdated must still land via
    // the user room. Simulate by connecting before any snapshot exists
    // for an uninvolved listing: here we just assert the user-room copy
    // arrives alongside the room copy.
    h.gateway
        .dispatch(
            &buyer_client.user_id,
            &buyer_client.client_id,
            send_message(conversation_id, "hello"),
        )
        .await;

    let snapshot_updates = |events: &[ServerEvent]| {
        events
            .iter()
            .filter(|e| matches!(e, ServerEvent::ConversationUpdated(_)))
            .count()
    };

    assert_eq!(snapshot_updates(&buyer_client.drain()), 1);
    assert_eq!(snapshot_updates(&seller_client.drain()), 1);
}

#[tokio::test]
async fn multiple_tabs_of_one_user_all_receive() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut tab1 = connect(&h, "seller-1").await;
    let mut tab2 = connect(&h, "seller-1").await;
    let buyer_client = connect(&h, "buyer-1").await;

    h.gateway
        .dispatch(
            &buyer_client.user_id,
            &buyer_client.client_id,
            send_message(conversation_id, "ping"),
        )
        .await;

    for tab in [&mut tab1, &mut tab2] {
        let events = tab.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::NewMessage(_))));
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::ConversationUpdated(_))));
    }
}

#[tokio::test]
async fn failed_send_acks_negatively_with_no_fanout() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut buyer_client = connect(&h, "buyer-1").await;
    let mut seller_client = connect(&h, "seller-1").await;
    let mut outsider = connect(&h, "lurker-9").await;

    // Outsider is not a party; the service rejects the send.
    h.gateway
        .dispatch(
            &outsider.user_id,
            &outsider.client_id,
            send_message(conversation_id, "let me in"),
        )
        .await;

    let outsider_events = outsider.drain();
    assert_eq!(outsider_events.len(), 1);
    assert!(matches!(
        &outsider_events[0],
        ServerEvent::Ack(ack) if !ack.success && ack.error.is_some()
    ));

    assert!(buyer_client.drain().is_empty());
    assert!(seller_client.drain().is_empty());

    // Nothing was persisted either.
    let history = h
        .service
        .conversation_with_messages(&conversation_id)
        .await
        .unwrap();
    assert_eq!(history.messages.len(), 1);
}

#[tokio::test]
async fn send_to_unknown_conversation_fails() {
    let h = harness();
    let mut client = connect(&h, "buyer-1").await;

    h.gateway
        .dispatch(
            &client.user_id,
            &client.client_id,
            send_message(ConversationId::new(), "anyone there?"),
        )
        .await;

    let events = client.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::Ack(ack) if !ack.success));
}

// =============================================================================
// Typing notifications
// =============================================================================

#[tokio::test]
async fn typing_excludes_the_typists_connection() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut buyer_client = connect(&h, "buyer-1").await;
    let mut seller_client = connect(&h, "seller-1").await;

    h.gateway
        .dispatch(
            &buyer_client.user_id,
            &buyer_client.client_id,
            ClientEvent::Typing(TypingPayload {
                conversation_id,
                is_typing: true,
            }),
        )
        .await;

    let seller_events = seller_client.drain();
    assert!(seller_events.iter().any(|e| matches!(
        e,
        ServerEvent::UserTyping(n) if n.is_typing && n.user_id == "buyer-1"
    )));

    // The typist only gets the ack back, not their own notification.
    let buyer_events = buyer_client.drain();
    assert_eq!(buyer_events.len(), 1);
    assert!(matches!(&buyer_events[0], ServerEvent::Ack(ack) if ack.success));
}

#[tokio::test]
async fn typing_failure_is_acked_negatively() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut outsider = connect(&h, "lurker-9").await;
    h.gateway
        .dispatch(
            &outsider.user_id,
            &outsider.client_id,
            ClientEvent::Typing(TypingPayload {
                conversation_id,
                is_typing: true,
            }),
        )
        .await;

    let events = outsider.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::Ack(ack) if !ack.success));
}

// =============================================================================
// Read receipts
// =============================================================================

#[tokio::test]
async fn messages_read_goes_to_other_party_only() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut buyer_client = connect(&h, "buyer-1").await;
    let mut seller_client = connect(&h, "seller-1").await;
    let mut bystander = connect(&h, "lurker-9").await;

    h.gateway
        .dispatch(
            &buyer_client.user_id,
            &buyer_client.client_id,
            ClientEvent::MarkAsRead(MarkAsReadPayload { conversation_id }),
        )
        .await;

    let seller_events = seller_client.drain();
    assert!(seller_events.iter().any(|e| matches!(
        e,
        ServerEvent::MessagesRead(n) if n.read_by == "buyer-1"
    )));

    // The reader gets an ack, no receipt of their own.
    let buyer_events = buyer_client.drain();
    assert_eq!(buyer_events.len(), 1);
    assert!(matches!(&buyer_events[0], ServerEvent::Ack(ack) if ack.success));

    assert!(bystander.drain().is_empty());
}

// =============================================================================
// Room membership
// =============================================================================

#[tokio::test]
async fn join_conversation_subscribes_late_connections() {
    let h = harness();

    // Buyer connects before the conversation exists, so the snapshot
    // missed it.
    let mut early_tab = connect(&h, "buyer-1").await;
    let conversation_id = seeded_conversation(&h).await;
    let seller_client = connect(&h, "seller-1").await;

    // Without joining, conversation-room traffic is missed.
    h.gateway
        .dispatch(
            &seller_client.user_id,
            &seller_client.client_id,
            send_message(conversation_id, "first"),
        )
        .await;
    let events = early_tab.drain();
    assert!(!events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage(_))));
    // But the user-room snapshot update still arrived.
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::ConversationUpdated(_))));

    // After an explicit join, room traffic flows.
    h.gateway
        .dispatch(
            &early_tab.user_id,
            &early_tab.client_id,
            ClientEvent::JoinConversation(JoinConversationPayload { conversation_id }),
        )
        .await;
    let events = early_tab.drain();
    assert!(matches!(&events[0], ServerEvent::Ack(ack) if ack.success));

    h.gateway
        .dispatch(
            &seller_client.user_id,
            &seller_client.client_id,
            send_message(conversation_id, "second"),
        )
        .await;
    assert!(early_tab
        .drain()
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage(n) if n.message.content == "second")));
}

#[tokio::test]
async fn join_is_a_subscription_not_an_authorization_grant() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    // Joining performs no membership check; authorization lives on the
    // mutating operations.
    let mut outsider = connect(&h, "lurker-9").await;
    h.gateway
        .dispatch(
            &outsider.user_id,
            &outsider.client_id,
            ClientEvent::JoinConversation(JoinConversationPayload { conversation_id }),
        )
        .await;

    let events = outsider.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::Ack(ack) if ack.success));

    // Being in the room still does not let them write to it.
    h.gateway
        .dispatch(
            &outsider.user_id,
            &outsider.client_id,
            send_message(conversation_id, "let me in"),
        )
        .await;

    let events = outsider.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::Ack(ack) if !ack.success));

    let history = h
        .service
        .conversation_with_messages(&conversation_id)
        .await
        .unwrap();
    assert_eq!(history.messages.len(), 1);
}

// =============================================================================
// Presence
// =============================================================================

#[tokio::test]
async fn connect_and_disconnect_track_presence() {
    let h = harness();

    let tab1 = connect(&h, "buyer-1").await;
    let tab2 = connect(&h, "buyer-1").await;
    assert!(h.registry.is_connected(&buyer()).await);
    assert_eq!(h.registry.connections_for(&buyer()).await.len(), 2);

    h.gateway.disconnect(&tab1.user_id, &tab1.client_id).await;
    assert!(h.registry.is_connected(&buyer()).await);

    h.gateway.disconnect(&tab2.user_id, &tab2.client_id).await;
    assert!(!h.registry.is_connected(&buyer()).await);
}

#[tokio::test]
async fn disconnected_client_receives_nothing_further() {
    let h = harness();
    let conversation_id = seeded_conversation(&h).await;

    let mut seller_client = connect(&h, "seller-1").await;
    let buyer_client = connect(&h, "buyer-1").await;

    h.gateway
        .disconnect(&seller_client.user_id, &seller_client.client_id)
        .await;

    h.gateway
        .dispatch(
            &buyer_client.user_id,
            &buyer_client.client_id,
            send_message(conversation_id, "gone?"),
        )
        .await;

    assert!(seller_client.drain().is_empty());
}
