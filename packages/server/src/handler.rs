//! HTTP and WebSocket handlers: the transport skin over the lifecycle.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use chitty_chat_shared::wire::{ChatMessage, LeaveRequest, MAX_MESSAGE_CHARS, UserInfo};

use super::{
    lifecycle,
    state::{AppState, JoinQuery},
};

/// `GET /ws?user_id=..&name=..` — the join call.
///
/// Registers (or reactivates) the user, then upgrades to a WebSocket that
/// stays open for the session and carries every broadcast delivery.
pub async fn join_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<JoinQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = query.user_id;
    if user_id.is_empty() {
        // The empty id is the system-notice sentinel, never a user.
        tracing::warn!("Rejecting join with empty user_id");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let name = query.name.unwrap_or_else(|| user_id.clone());

    let (rx, session) = lifecycle::join(&state, &user_id, &name).await;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, session, rx)))
}

/// Pump broadcast deliveries down the socket until the session ends.
///
/// The receiver is the subscription handle created at join time; when the
/// socket errors or the client disconnects, the entry is marked inactive and
/// the receiver is dropped, closing the channel. Deactivation is scoped to
/// this session's token: a repeat join swaps in a fresh channel, which ends
/// this task, and its teardown must not touch the reactivated entry.
async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    user_id: String,
    session: u64,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Deliver stamped copies to this client, one in-order stream.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // The stream is server-to-client only; this side just watches for the
    // client going away.
    let user_id_for_recv = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Close(_)) => {
                    tracing::info!("Client '{}' closed its stream", user_id_for_recv);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Stream error for '{}': {}", user_id_for_recv, e);
                    break;
                }
            }
        }
    });

    // Whichever side ends first takes the session down with it.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    state.registry.mark_inactive_if_current(&user_id, session).await;
    tracing::info!("Session for '{}' ended", user_id);
}

/// `POST /api/publish` — merge the carried timestamp and broadcast.
pub async fn publish_handler(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ChatMessage>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if message.text.is_empty() || message.text.chars().count() > MAX_MESSAGE_CHARS {
        tracing::warn!(
            "Rejecting message from '{}' with invalid length",
            message.sender_id
        );
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    lifecycle::publish(&state, message).await;
    Ok(Json(serde_json::json!({})))
}

/// `POST /api/leave` — deactivate the user and announce the departure.
pub async fn leave_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LeaveRequest>,
) -> Json<serde_json::Value> {
    lifecycle::leave(&state, request).await;
    Json(serde_json::json!({}))
}

/// `GET /api/users` — registered users with their active flags.
pub async fn list_users_handler(State(state): State<Arc<AppState>>) -> Json<Vec<UserInfo>> {
    Json(state.registry.users().await)
}

/// `GET /api/health`
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
