//! Axum routes for chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    get_conversation, get_messages, list_conversations, mark_read, send_message,
    start_conversation, unread_count, ChatAppState,
};

/// Creates routes for chat endpoints.
///
/// REST Endpoints:
/// - POST /api/chat/start/{listing_id} - Start or resume a conversation
/// - GET  /api/chat - List the caller's conversations
/// - GET  /api/chat/unread-count - Total unread messages
/// - GET  /api/chat/{conversation_id} - Conversation with full history
/// - GET  /api/chat/{conversation_id}/messages - Paginated history
/// - POST /api/chat/{conversation_id}/messages - Send a message
/// - POST /api/chat/{conversation_id}/read - Mark as read
///
/// The realtime surface lives on a separate router (`/ws/chat`).
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", get(list_conversations))
        .route("/chat/unread-count", get(unread_count))
        .route("/chat/start/{listing_id}", post(start_conversation))
        .route("/chat/{conversation_id}", get(get_conversation))
        .route(
            "/chat/{conversation_id}/messages",
            get(get_messages).post(send_message),
        )
        .route("/chat/{conversation_id}/read", post(mark_read))
}

/// Combined router with all chat routes under /api.
pub fn chat_router() -> Router<ChatAppState> {
    Router::new().nest("/api", chat_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_routes_creates_valid_router() {
        let _routes = chat_routes();
    }

    #[test]
    fn chat_router_creates_combined_router() {
        let _router = chat_router();
    }
}
