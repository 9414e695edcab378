//! Shared server state.

use serde::Deserialize;

use chitty_chat_shared::clock::LamportClock;

use super::registry::ConnectionRegistry;

/// Query parameters for the WebSocket join endpoint.
#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Shared application state.
///
/// The registry and the clock each guard their own internals; callers never
/// see the locks.
#[derive(Default)]
pub struct AppState {
    /// Server-side Lamport clock, merged on every inbound publish/leave and
    /// ticked on every broadcast.
    pub clock: LamportClock,
    /// Map of user id to connection, owned exclusively by the registry.
    pub registry: ConnectionRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
