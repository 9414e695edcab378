//! Chitty-Chat client binary.
//!
//! Joins the chat over a long-lived WebSocket stream, publishes lines typed
//! at the prompt, and renders every delivered message with the local Lamport
//! clock.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chitty-chat-client -- --user-id alice
//! cargo run --bin chitty-chat-client -- -u bob --server http://127.0.0.1:8080
//! ```

use clap::Parser;

use chitty_chat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "chitty-chat-client")]
#[command(about = "CLI client for the Chitty-Chat broadcast server", long_about = None)]
struct Args {
    /// User id (stable for the session; generated if omitted)
    #[arg(short = 'u', long)]
    user_id: Option<String>,

    /// Display name (defaults to the user id)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Server base URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    let user_id = args
        .user_id
        .unwrap_or_else(|| format!("user-{}", uuid::Uuid::new_v4().simple()));
    let name = args.name.unwrap_or_else(|| user_id.clone());

    if let Err(e) = chitty_chat_client::run_client(args.server, user_id, name).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
