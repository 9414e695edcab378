//! Connection lifecycle: the join / publish / leave entry points.
//!
//! Per user the state machine is `Joined(active) -> Left(inactive)`, with
//! `Joined` re-enterable through a repeat join. Each entry point advances the
//! shared clock per the Lamport rule before touching the registry or the
//! broadcast engine.

use tokio::sync::mpsc;

use chitty_chat_shared::wire::{ChatMessage, LeaveRequest};

use super::{broadcast::broadcast, state::AppState};

/// Register (or reactivate) a user and return its delivery channel receiver
/// plus the session token identifying this registration.
///
/// The caller owns the receiver for the lifetime of the session: the socket
/// task drains it until it closes, which keeps the join call open until the
/// connection dies. The token scopes the eventual teardown so a session the
/// user has since re-joined over cannot deactivate the fresh entry.
pub async fn join(
    state: &AppState,
    user_id: &str,
    name: &str,
) -> (mpsc::UnboundedReceiver<String>, u64) {
    let (rx, session) = state.registry.add(user_id, name).await;
    tracing::info!(
        "[server: {}] User '{}' joined",
        state.clock.current(),
        user_id
    );
    (rx, session)
}

/// Merge the message's timestamp into the server clock and broadcast it.
///
/// An empty sender id marks a system notice; the broadcast engine appends the
/// delivery stamp to its text. Per-recipient delivery failures are absorbed
/// inside the broadcast and never surface to the publisher.
pub async fn publish(state: &AppState, message: ChatMessage) {
    let merged = state.clock.merge(message.lamport);

    if message.is_system_notice() {
        tracing::info!("[server: {}] System notice published: {}", merged, message.text);
    } else {
        tracing::info!(
            "[server: {}] '{}' published: {}",
            merged,
            message.sender_id,
            message.text
        );
    }

    broadcast(state, &message).await;
}

/// Merge the departure timestamp, deactivate the user, and announce it.
///
/// An unknown user id is treated as already-left: the entry (if any) stays
/// untouched and the notice is still broadcast.
pub async fn leave(state: &AppState, request: LeaveRequest) {
    let merged = state.clock.merge(request.lamport);
    state.registry.mark_inactive(&request.user_id).await;
    tracing::info!("[server: {}] User '{}' left", merged, request.user_id);

    let notice = ChatMessage {
        sender_id: String::new(),
        text: format!("{} left Chitty-Chat at Lamport time ", request.user_id),
        lamport: merged,
    };
    broadcast(state, &notice).await;
}
