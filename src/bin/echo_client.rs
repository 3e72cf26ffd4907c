//! One-shot client for the echo endpoint.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin echo-client
//! cargo run --bin echo-client -- --url http://127.0.0.1:8080 "Hello world!"
//! ```

use clap::Parser;

use chat_relay::{
    common::logger::setup_logger,
    message::{EchoRequest, EchoResponse},
};

#[derive(Parser, Debug)]
#[command(name = "echo-client")]
#[command(about = "One-shot echo request against the chat relay server", long_about = None)]
struct Args {
    /// Base HTTP URL of the server
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Message to echo
    #[arg(default_value = "Hello world!")]
    message: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let result = reqwest::Client::new()
        .post(format!("{}/api/echo", args.url))
        .json(&EchoRequest {
            message: args.message,
        })
        .send()
        .await
        .and_then(|resp| resp.error_for_status());

    match result {
        Ok(resp) => match resp.json::<EchoResponse>().await {
            Ok(echo) => println!("Got from server: {}", echo.response),
            Err(e) => {
                tracing::error!("Invalid echo response: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!("Echo request failed: {}", e);
            std::process::exit(1);
        }
    }
}
