//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use super::{
    chat::ChatServer,
    handler::{AppState, echo, health_check, websocket_handler},
    signal::shutdown_signal,
};

/// Build the relay's router around an already-started `ChatServer`.
pub fn app(chat: Arc<ChatServer>) -> Router {
    let state = Arc::new(AppState { chat });
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/echo", post(echo))
        .route("/api/health", get(health_check))
        .with_state(state)
}

/// Run the chat relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let chat = ChatServer::start();
    let app = app(chat.clone());

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Chat relay listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    // On the shutdown signal, close every live session so their handlers
    // finish and the graceful drain below can complete; anything still in
    // the broadcast queue is dropped.
    let shutdown = async move {
        shutdown_signal().await;
        chat.shutdown().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
