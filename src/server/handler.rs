//! HTTP and WebSocket handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::StreamExt;

use crate::message::{EchoRequest, EchoResponse};

use super::{
    chat::ChatServer,
    connection::Connection,
    transport::{WebSocketMessageSink, WebSocketMessageStream},
};

/// Shared application state
pub struct AppState {
    pub chat: Arc<ChatServer>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_session(socket, state))
}

/// One full session lifecycle: create and register the connection, pump
/// inbound messages into the broadcast queue until the stream ends, then
/// unregister and close regardless of outcome.
pub async fn handle_session(socket: WebSocket, state: Arc<AppState>) {
    let (write, read) = socket.split();
    let mut stream = WebSocketMessageStream::new(read);
    let sink = WebSocketMessageSink::new(write);

    let conn = Connection::spawn(sink);
    let session_id = conn.id();
    state.chat.register(conn.clone()).await;
    tracing::info!("Session {} connected", session_id);

    let broadcast = state.chat.broadcast_sender();
    let result = conn.pump_inbound(&mut stream, &broadcast).await;

    state.chat.unregister(&conn).await;
    conn.close();

    match result {
        Ok(()) => tracing::info!("Session {} closed", session_id),
        Err(e) => tracing::warn!("Session {} ended with error: {}", session_id, e),
    }
}

/// Stateless echo endpoint.
pub async fn echo(Json(req): Json<EchoRequest>) -> Json<EchoResponse> {
    Json(EchoResponse {
        response: format!("My Echo: {}", req.message),
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_prefixes_the_message() {
        let Json(response) = echo(Json(EchoRequest {
            message: "Hello world!".to_string(),
        }))
        .await;

        assert_eq!(response.response, "My Echo: Hello world!");
    }
}
