//! Realtime chat gateway.
//!
//! Handles the HTTP → WebSocket upgrade and the connection lifecycle:
//! 1. Validate the caller's token (connections failing auth are dropped
//!    silently, before any room state exists)
//! 2. Register the connection and join its rooms
//! 3. Dispatch client events until disconnect
//! 4. Clean up room membership and presence
//!
//! Every event follows persist-then-broadcast: the service call must
//! succeed before any room sees a notification, and a failure produces a
//! negative ack on the originating connection with no fan-out at all.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::application::chat::ChatService;
use crate::adapters::http::chat::dto::{ConversationView, MessageView};
use crate::domain::chat::{ChatError, MessageKind};
use crate::domain::foundation::{AuthError, ConversationId, UserId};
use crate::ports::{ClientId, ConnectionRegistry, SessionValidator};

use super::messages::{
    AckPayload, ClientEvent, ConversationNotice, MessageNotice, ReadNotice, SendMessagePayload,
    ServerEvent, TypingNotice, TypingPayload,
};
use super::rooms::{RoomId, RoomManager};

/// Connection-level orchestrator for the realtime protocol.
///
/// Owns no sockets itself; `handle_socket` feeds it lifecycle calls and
/// decoded events, which makes the routing logic testable without a live
/// transport.
pub struct ChatGateway {
    chat: Arc<ChatService>,
    rooms: Arc<RoomManager>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl ChatGateway {
    /// Creates a new gateway over the service, rooms and presence registry.
    pub fn new(
        chat: Arc<ChatService>,
        rooms: Arc<RoomManager>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            chat,
            rooms,
            registry,
        }
    }

    /// Register an authenticated connection.
    ///
    /// The connection joins its user room and, as a connect-time snapshot,
    /// the room of every conversation the user currently participates in.
    /// Conversations started afterwards require an explicit
    /// `joinConversation`.
    pub async fn connect(
        &self,
        user_id: &UserId,
        client_id: ClientId,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.rooms.connect(client_id, outbox).await;
        self.registry.register(user_id, client_id).await;
        self.rooms
            .join(RoomId::User(user_id.clone()), client_id)
            .await;

        match self.chat.conversation_ids(user_id).await {
            Ok(conversation_ids) => {
                for conversation_id in conversation_ids {
                    self.rooms
                        .join(RoomId::Conversation(conversation_id), client_id)
                        .await;
                }
            }
            Err(e) => {
                // Connection stays usable; the client can still join rooms
                // explicitly.
                tracing::warn!(user_id = %user_id, "room snapshot failed: {}", e);
            }
        }

        tracing::debug!(user_id = %user_id, client_id = %client_id, "client connected");
    }

    /// Tear down a connection's rooms and presence entry.
    pub async fn disconnect(&self, user_id: &UserId, client_id: &ClientId) {
        self.rooms.disconnect(client_id).await;
        self.registry.unregister(user_id, client_id).await;
        tracing::debug!(user_id = %user_id, client_id = %client_id, "client disconnected");
    }

    /// Route one decoded client event.
    pub async fn dispatch(&self, user_id: &UserId, client_id: &ClientId, event: ClientEvent) {
        match event {
            ClientEvent::SendMessage(payload) => {
                self.on_send_message(user_id, client_id, payload).await
            }
            ClientEvent::Typing(payload) => self.on_typing(user_id, client_id, payload).await,
            ClientEvent::MarkAsRead(payload) => {
                self.on_mark_as_read(user_id, client_id, payload.conversation_id)
                    .await
            }
            ClientEvent::JoinConversation(payload) => {
                self.on_join_conversation(client_id, payload.conversation_id)
                    .await
            }
        }
    }

    /// Negative-ack an event that could not be decoded.
    pub async fn reject(&self, client_id: &ClientId, reason: impl Into<String>) {
        self.rooms
            .send_to(client_id, ServerEvent::Ack(AckPayload::err(reason)))
            .await;
    }

    /// Negative-ack a failed operation. Caller mistakes only get the ack;
    /// store failures are also logged server-side.
    async fn fail(&self, client_id: &ClientId, error: ChatError) {
        if !error.is_client_error() {
            tracing::error!(client_id = %client_id, "chat operation failed: {}", error);
        }
        self.reject(client_id, error.to_string()).await;
    }

    async fn on_send_message(
        &self,
        user_id: &UserId,
        client_id: &ClientId,
        payload: SendMessagePayload,
    ) {
        // The realtime path only carries text; other kinds go through REST.
        let result = self
            .chat
            .send_message(
                user_id,
                &payload.conversation_id,
                payload.content,
                MessageKind::Text,
            )
            .await;

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                self.fail(client_id, e).await;
                return;
            }
        };

        let view = MessageView::from(&message);
        self.rooms
            .broadcast(
                &RoomId::Conversation(payload.conversation_id),
                ServerEvent::NewMessage(MessageNotice {
                    conversation_id: payload.conversation_id.to_string(),
                    message: view.clone(),
                }),
            )
            .await;

        // Snapshot refresh for conversation lists on both sides.
        match self.chat.conversation_overview(&payload.conversation_id).await {
            Ok(overview) => {
                let updated = ServerEvent::ConversationUpdated(ConversationNotice {
                    conversation: ConversationView::from(&overview),
                });
                self.rooms
                    .broadcast(
                        &RoomId::User(overview.conversation.buyer_id.clone()),
                        updated.clone(),
                    )
                    .await;
                self.rooms
                    .broadcast(&RoomId::User(overview.conversation.seller_id.clone()), updated)
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %payload.conversation_id,
                    "conversationUpdated skipped: {}",
                    e
                );
            }
        }

        self.rooms
            .send_to(client_id, ServerEvent::Ack(AckPayload::with_message(view)))
            .await;
    }

    async fn on_typing(&self, user_id: &UserId, client_id: &ClientId, payload: TypingPayload) {
        let result = self
            .chat
            .update_typing_status(&payload.conversation_id, user_id, payload.is_typing)
            .await;

        if let Err(e) = result {
            self.fail(client_id, e).await;
            return;
        }

        self.rooms
            .broadcast_except(
                &RoomId::Conversation(payload.conversation_id),
                client_id,
                ServerEvent::UserTyping(TypingNotice {
                    conversation_id: payload.conversation_id.to_string(),
                    user_id: user_id.to_string(),
                    is_typing: payload.is_typing,
                }),
            )
            .await;

        self.rooms
            .send_to(client_id, ServerEvent::Ack(AckPayload::ok()))
            .await;
    }

    async fn on_mark_as_read(
        &self,
        user_id: &UserId,
        client_id: &ClientId,
        conversation_id: ConversationId,
    ) {
        let outcome = match self.chat.mark_messages_read(&conversation_id, user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail(client_id, e).await;
                return;
            }
        };

        // The author of the now-read messages is the only one who cares.
        self.rooms
            .broadcast(
                &RoomId::User(outcome.other_party),
                ServerEvent::MessagesRead(ReadNotice {
                    conversation_id: conversation_id.to_string(),
                    read_by: user_id.to_string(),
                }),
            )
            .await;

        self.rooms
            .send_to(client_id, ServerEvent::Ack(AckPayload::ok()))
            .await;
    }

    async fn on_join_conversation(&self, client_id: &ClientId, conversation_id: ConversationId) {
        // A room subscription is not an authorization grant: membership is
        // enforced on every mutating operation, not here.
        self.rooms
            .join(RoomId::Conversation(conversation_id), *client_id)
            .await;
        self.rooms
            .send_to(client_id, ServerEvent::Ack(AckPayload::ok()))
            .await;
    }
}

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct ChatGatewayState {
    pub gateway: Arc<ChatGateway>,
    pub sessions: Arc<dyn SessionValidator>,
}

impl ChatGatewayState {
    /// Create a new gateway state.
    pub fn new(gateway: Arc<ChatGateway>, sessions: Arc<dyn SessionValidator>) -> Self {
        Self { gateway, sessions }
    }
}

/// Handle WebSocket upgrade requests for realtime chat.
///
/// Route: `GET /ws/chat?token=...`
///
/// The token may come from a `token` query parameter or an
/// `Authorization: Bearer` header. Validation happens after the upgrade;
/// a missing or invalid token drops the socket without any event.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<ChatGatewayState>,
) -> Response {
    let token = bearer_token(&params, &headers);
    ws.on_upgrade(move |socket| handle_socket(socket, token, state))
}

/// Pulls the connect credential from the `token` query parameter or the
/// `Authorization: Bearer` header.
fn bearer_token(
    params: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<String, AuthError> {
    params
        .get("token")
        .cloned()
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned)
        })
        .ok_or(AuthError::MissingCredential)
}

/// Drive an established WebSocket connection for its lifetime.
async fn handle_socket(
    socket: WebSocket,
    token: Result<String, AuthError>,
    state: ChatGatewayState,
) {
    let user = match token {
        Ok(token) => state.sessions.validate(&token).await,
        Err(e) => Err(e),
    };
    let user = match user {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!("socket dropped: {}", e);
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();
    let client_id = ClientId::new();
    let (outbox, mut inbox) = mpsc::unbounded_channel::<ServerEvent>();

    state.gateway.connect(&user.id, client_id, outbox).await;

    // Drain the outbox into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("event serialization failed: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Decode and dispatch inbound frames.
    let gateway = state.gateway.clone();
    let user_id = user.id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => gateway.dispatch(&user_id, &client_id, event).await,
                    Err(e) => {
                        gateway
                            .reject(&client_id, format!("Unrecognized event: {}", e))
                            .await;
                    }
                },
                Ok(Message::Binary(_)) => {
                    gateway
                        .reject(&client_id, "Binary frames are not supported")
                        .await;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level keepalive, handled by axum.
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::debug!(client_id = %client_id, "receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.gateway.disconnect(&user.id, &client_id).await;
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<ChatGatewayState> {
    use axum::routing::get;

    axum::Router::new().route("/ws/chat", get(ws_handler))
}
