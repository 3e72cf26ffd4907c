//! Transport seam between the relay core and the WebSocket layer.
//!
//! The core only ever sees typed `ChatMessage` values through these two
//! traits; framing, JSON encoding and close-frame handling live in the
//! WebSocket implementations below.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};

use crate::{error::TransportError, message::ChatMessage};

/// Receive half of a transport session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStream: Send {
    /// Read the next chat message. Returns `Ok(None)` on clean end of
    /// stream and `Err` on any other read failure.
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, TransportError>;
}

/// Send half of a transport session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send {
    /// Write one framed chat message to the stream.
    async fn send_message(&mut self, msg: &ChatMessage) -> Result<(), TransportError>;
}

/// `MessageStream` over the receive half of an axum WebSocket.
pub struct WebSocketMessageStream {
    inner: SplitStream<WebSocket>,
}

impl WebSocketMessageStream {
    pub fn new(inner: SplitStream<WebSocket>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl MessageStream for WebSocketMessageStream {
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, TransportError> {
        loop {
            let frame = match self.inner.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(TransportError::WebSocket(e.to_string())),
                None => return Ok(None),
            };

            match frame {
                Message::Text(text) => match serde_json::from_str::<ChatMessage>(&text) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => {
                        tracing::warn!("Ignoring frame that is not a chat message: {}", e);
                    }
                },
                Message::Close(_) => return Ok(None),
                // Ping/pong is handled by the protocol layer; binary frames
                // are not part of the chat contract.
                _ => {}
            }
        }
    }
}

/// `MessageSink` over the send half of an axum WebSocket.
pub struct WebSocketMessageSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WebSocketMessageSink {
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl MessageSink for WebSocketMessageSink {
    async fn send_message(&mut self, msg: &ChatMessage) -> Result<(), TransportError> {
        let json = serde_json::to_string(msg)
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        self.inner
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }
}
