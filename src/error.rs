//! Error types for the chat relay.

use thiserror::Error;

/// Failure on a single session's transport stream. Fatal to that session
/// only; never propagated to other sessions or the dispatcher.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying WebSocket read or write failed
    #[error("websocket transport error: {0}")]
    WebSocket(String),
}

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),
}
