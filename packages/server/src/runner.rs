//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{health_check, join_handler, leave_handler, list_users_handler, publish_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Run the Chitty-Chat server.
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails while
/// serving. Binding failure at startup is fatal by design.
pub async fn run_server(
    host: String,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app_state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/ws", get(join_handler))
        .route("/api/publish", post(publish_handler))
        .route("/api/leave", post(leave_handler))
        .route("/api/users", get(list_users_handler))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(
        "[server: 0] Chitty-Chat server listening on {}",
        listener.local_addr()?
    );
    tracing::info!("Join stream at: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
