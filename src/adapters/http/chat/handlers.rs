//! HTTP handlers for chat endpoints.
//!
//! This is the non-realtime fallback surface: the same ChatService
//! operations as the socket gateway, but with no fan-out to rooms.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::chat::ChatService;
use crate::domain::chat::{ChatError, MessageKind};
use crate::domain::foundation::{ConversationId, ListingId};

use super::dto::{
    ConversationView, ConversationWithMessagesView, ErrorResponse, MessageView, Page,
    PaginationParams, SendMessageRequest, UnreadCountView,
};
use crate::adapters::http::middleware::RequireAuth;

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub chat: Arc<ChatService>,
}

impl ChatAppState {
    /// Creates a new ChatAppState.
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }
}

/// API-level error for chat endpoints.
#[derive(Debug)]
pub enum ChatApiError {
    BadRequest(String),
    NotFound(String),
    Forbidden(String),
    Internal(String),
}

impl From<ChatError> for ChatApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::ListingNotFound(_) | ChatError::ConversationNotFound(_) => {
                ChatApiError::NotFound(err.to_string())
            }
            ChatError::SelfConversation | ChatError::NotParticipant => {
                ChatApiError::Forbidden(err.to_string())
            }
            ChatError::Store(msg) => ChatApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ChatApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(msg, "BAD_REQUEST"),
            ),
            ChatApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(msg, "NOT_FOUND"))
            }
            ChatApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, ErrorResponse::new(msg, "FORBIDDEN"))
            }
            ChatApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal error occurred", "INTERNAL_ERROR"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

/// POST /api/chat/start/{listing_id} - Start or resume a conversation.
///
/// Idempotent per (buyer, seller, listing) triple.
///
/// # Errors
/// - 401: no valid auth token
/// - 403: caller is the listing's own seller
/// - 404: listing does not exist
pub async fn start_conversation(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(listing_id): Path<String>,
) -> Result<impl IntoResponse, ChatApiError> {
    let listing_id: ListingId = listing_id
        .parse()
        .map_err(|_| ChatApiError::BadRequest("Invalid listing ID format".to_string()))?;

    let result = state.chat.start_conversation(&user.id, &listing_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationWithMessagesView::from(&result)),
    ))
}

/// GET /api/chat - List the caller's conversations, most recent first.
pub async fn list_conversations(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ChatApiError> {
    let overviews = state.chat.user_conversations(&user.id).await?;
    let views: Vec<ConversationView> = overviews.iter().map(ConversationView::from).collect();
    Ok((StatusCode::OK, Json(views)))
}

/// GET /api/chat/unread-count - Total unread messages for the caller.
pub async fn unread_count(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ChatApiError> {
    let unread_count = state.chat.unread_count(&user.id).await?;
    Ok((StatusCode::OK, Json(UnreadCountView { unread_count })))
}

/// GET /api/chat/{conversation_id} - One conversation plus full history.
pub async fn get_conversation(
    State(state): State<ChatAppState>,
    RequireAuth(_user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ChatApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let result = state
        .chat
        .conversation_with_messages(&conversation_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ConversationWithMessagesView::from(&result)),
    ))
}

/// GET /api/chat/{conversation_id}/messages - Paginated message history.
///
/// The window is offset from the most recent message and returned
/// oldest-first within the window.
pub async fn get_messages(
    State(state): State<ChatAppState>,
    RequireAuth(_user): RequireAuth,
    Path(conversation_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ChatApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let offset = params.effective_offset();
    let limit = params.effective_limit();

    let (messages, total) = state
        .chat
        .messages_page(&conversation_id, offset, limit)
        .await?;

    let views: Vec<MessageView> = messages.iter().map(MessageView::from).collect();
    Ok((StatusCode::OK, Json(Page::new(views, total, offset, limit))))
}

/// POST /api/chat/{conversation_id}/messages - Send a message.
///
/// # Errors
/// - 403: caller is not a party to the conversation
/// - 404: conversation does not exist
pub async fn send_message(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ChatApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let kind = request.kind.map(MessageKind::from).unwrap_or(MessageKind::Text);
    let message = state
        .chat
        .send_message(&user.id, &conversation_id, request.content, kind)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageView::from(&message))))
}

/// POST /api/chat/{conversation_id}/read - Mark the other party's messages
/// as read. Idempotent.
pub async fn mark_read(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ChatApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    state
        .chat
        .mark_messages_read(&conversation_id, &user.id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Messages marked as read" })),
    ))
}

fn parse_conversation_id(raw: &str) -> Result<ConversationId, ChatApiError> {
    raw.parse()
        .map_err(|_| ChatApiError::BadRequest("Invalid conversation ID format".to_string()))
}
