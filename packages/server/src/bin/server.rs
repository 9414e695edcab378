//! Chitty-Chat server binary.
//!
//! Accepts joins over WebSocket and publish/leave calls over HTTP, tagging
//! every broadcast delivery with a Lamport timestamp.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chitty-chat-server
//! cargo run --bin chitty-chat-server -- --host 0.0.0.0 --port 3000
//! ```

use clap::Parser;

use chitty_chat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "chitty-chat-server")]
#[command(about = "Lamport-clocked chat broadcast server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = chitty_chat_server::run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
