//! Wire-level message types.
//!
//! All messages travel as JSON. Chat messages are exchanged as WebSocket
//! text frames; the echo types ride on a plain HTTP endpoint.

use serde::{Deserialize, Serialize};

/// A single chat message. Immutable once constructed; cloned, never
/// mutated, as it moves from the sender's session to every outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
        }
    }
}

/// Request body for the echo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoRequest {
    pub message: String,
}

/// Response body for the echo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoResponse {
    pub response: String,
}
