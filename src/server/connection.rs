//! Per-session connection management.
//!
//! A `Connection` wraps the send half of one transport session. All writes
//! go through a private bounded queue drained by a dedicated sender task,
//! so concurrent broadcast fan-out never interleaves writes on a single
//! stream. Delivery is best effort: once the connection is closing, late
//! sends are dropped silently.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{error::TransportError, message::ChatMessage};

use super::transport::{MessageSink, MessageStream};

/// Messages a single session may have queued outbound before further
/// broadcasts to it are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// One live chat session's server-side state.
pub struct Connection {
    id: Uuid,
    outbound: mpsc::Sender<ChatMessage>,
    cancel: CancellationToken,
}

impl Connection {
    /// Wrap the send half of a transport session and spawn the sender
    /// task. That task is the only writer to the sink for the lifetime of
    /// the connection.
    pub fn spawn(sink: impl MessageSink + 'static) -> Arc<Self> {
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();
        tokio::spawn(sender_loop(outbound_rx, sink, cancel.clone()));
        Arc::new(Self {
            id: Uuid::new_v4(),
            outbound,
            cancel,
        })
    }

    /// Opaque session id, unique per connection.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueue a message for delivery to this session. Never blocks and
    /// never fails: a closed connection or a full outbound queue drops the
    /// message.
    pub fn send(&self, msg: ChatMessage) {
        if self.cancel.is_cancelled() {
            // Late send racing a close: drop, not an error.
            return;
        }
        match self.outbound.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Outbound queue full for session {}, dropping message", self.id);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Send to closed session {}, dropping message", self.id);
            }
        }
    }

    /// Mark the connection closed and stop the sender task. Idempotent and
    /// safe to call concurrently with `send` and `pump_inbound`.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Receive loop: read messages from the transport session and forward
    /// them to the broadcast queue until the stream ends.
    ///
    /// Both the read and the forward race the connection's cancellation
    /// token, so a connection closed from elsewhere (write failure, server
    /// shutdown) promptly unblocks this loop instead of leaking a stuck
    /// forwarder. Clean end of stream and forced close return `Ok`; any
    /// other read failure closes the connection and returns the error.
    pub async fn pump_inbound<S: MessageStream>(
        &self,
        stream: &mut S,
        broadcast: &mpsc::Sender<ChatMessage>,
    ) -> Result<(), TransportError> {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                next = stream.next_message() => next,
            };

            match next {
                Ok(Some(msg)) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Ok(()),
                        res = broadcast.send(msg) => {
                            if res.is_err() {
                                // Dispatcher has shut down; end the session.
                                self.close();
                                return Ok(());
                            }
                        }
                    }
                }
                Ok(None) => {
                    self.close();
                    return Ok(());
                }
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
    }
}

/// Drains the outbound queue strictly in FIFO order and writes each
/// message to the sink. A write failure is not retried: the message is
/// dropped and the connection is closed, which also terminates the
/// session's receive loop.
async fn sender_loop(
    mut outbound: mpsc::Receiver<ChatMessage>,
    mut sink: impl MessageSink,
    cancel: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = outbound.recv() => match maybe {
                Some(msg) => msg,
                None => break,
            },
        };

        if let Err(e) = sink.send_message(&msg).await {
            tracing::warn!("Write failed, closing session: {}", e);
            cancel.cancel();
            break;
        }
    }
}
