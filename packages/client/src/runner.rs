//! Client execution logic with reconnection support.

use std::sync::Arc;
use std::time::Duration;

use chitty_chat_shared::clock::LamportClock;

use super::{error::ClientError, session::run_client_session};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the client, reconnecting on connection loss.
///
/// The Lamport clock lives here so it spans reconnects; a repeat join is a
/// reactivation on the server, not a new identity.
pub async fn run_client(base_url: String, user_id: String, name: String) -> Result<(), ClientError> {
    let clock = Arc::new(LamportClock::new());
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Connecting to {} as '{}' (attempt {}/{})",
            base_url,
            user_id,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&base_url, &user_id, &name, clock.clone()).await {
            Ok(()) => {
                tracing::info!("Session ended normally");
                break;
            }
            Err(e @ ClientError::Rejected(_)) => {
                // The server refused us outright; retrying will not help.
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    return Err(ClientError::Connection(format!(
                        "failed to reconnect after {} attempts",
                        MAX_RECONNECT_ATTEMPTS
                    )));
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }

    Ok(())
}
