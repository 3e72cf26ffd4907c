//! Chat relay client.
//!
//! Connects to the relay and sends each stdin line as a chat message
//! attributed to the given username. Every broadcast received from the
//! server is printed as `user: text`. Type `quit` (or press Ctrl+C) to
//! close the send direction and exit once the stream ends.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin client -- ws://127.0.0.1:8080/ws alice
//! ```

use clap::Parser;

use chat_relay::common::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "WebSocket chat relay client", long_about = None)]
struct Args {
    /// WebSocket URL of the relay (e.g., ws://127.0.0.1:8080/ws)
    url: String,

    /// Username attached to every message you send
    user: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = chat_relay::client::run_client(args.url, args.user).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
