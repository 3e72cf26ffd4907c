//! Broadcast dispatcher.
//!
//! `ChatServer` owns the registry of live connections and the single
//! broadcast queue. One dispatcher task drains the queue and fans each
//! message out to every registered connection. Fan-out uses the
//! connections' non-blocking best-effort `send`, performed serially by
//! the dispatcher, which both keeps a stalled consumer from delaying the
//! round and preserves per-connection delivery order across messages.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::message::ChatMessage;

use super::{connection::Connection, registry::Registry};

/// Inbound messages that may be queued for dispatch before session
/// receive loops start to feel backpressure.
pub const BROADCAST_QUEUE_CAPACITY: usize = 256;

/// The chat relay's dispatcher and session registry.
pub struct ChatServer {
    registry: Arc<Registry>,
    broadcast: mpsc::Sender<ChatMessage>,
    shutdown: CancellationToken,
}

impl ChatServer {
    /// Create the server and spawn its dispatcher task.
    pub fn start() -> Arc<Self> {
        let (broadcast, broadcast_rx) = mpsc::channel(BROADCAST_QUEUE_CAPACITY);
        let registry = Arc::new(Registry::new());
        let shutdown = CancellationToken::new();
        tokio::spawn(dispatch_loop(
            broadcast_rx,
            registry.clone(),
            shutdown.clone(),
        ));
        Arc::new(Self {
            registry,
            broadcast,
            shutdown,
        })
    }

    /// Sender half of the broadcast queue, handed to each session's
    /// receive loop.
    pub fn broadcast_sender(&self) -> mpsc::Sender<ChatMessage> {
        self.broadcast.clone()
    }

    /// Make a connection eligible for broadcasts.
    pub async fn register(&self, conn: Arc<Connection>) {
        self.registry.register(conn).await;
    }

    /// Withdraw a connection from broadcasts. Safe to call while a
    /// dispatch round is in flight.
    pub async fn unregister(&self, conn: &Connection) -> bool {
        self.registry.unregister(conn.id()).await
    }

    pub async fn session_count(&self) -> usize {
        self.registry.len().await
    }

    /// Stop the relay: close every live session, then stop the
    /// dispatcher. Closing a session cancels its lifecycle token, which
    /// unblocks its receive pump; the session handler then unregisters it
    /// through the normal teardown path. Messages still sitting in the
    /// broadcast queue are dropped, not drained.
    pub async fn shutdown(&self) {
        for conn in self.registry.snapshot().await {
            conn.close();
        }
        self.shutdown.cancel();
    }
}

async fn dispatch_loop(
    mut broadcast_rx: mpsc::Receiver<ChatMessage>,
    registry: Arc<Registry>,
    shutdown: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = shutdown.cancelled() => break,
            maybe = broadcast_rx.recv() => match maybe {
                Some(msg) => msg,
                None => break,
            },
        };

        // Snapshot under the lock, deliver outside it.
        let targets = registry.snapshot().await;
        tracing::debug!(
            "Dispatching message from '{}' to {} session(s)",
            msg.user,
            targets.len()
        );
        for conn in targets {
            conn.send(msg.clone());
        }
    }
    tracing::debug!("Dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::super::transport::MockMessageSink;
    use super::*;

    fn recording_connection() -> (Arc<Connection>, mpsc::UnboundedReceiver<ChatMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sink = MockMessageSink::new();
        sink.expect_send_message().returning(move |msg| {
            tx.send(msg.clone()).unwrap();
            Ok(())
        });
        (Connection::spawn(sink), rx)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_registered_connection_once() {
        let server = ChatServer::start();
        let (first, mut first_rx) = recording_connection();
        let (second, mut second_rx) = recording_connection();
        server.register(first).await;
        server.register(second).await;

        server
            .broadcast_sender()
            .send(ChatMessage::new("alice", "hello"))
            .await
            .unwrap();

        assert_eq!(first_rx.recv().await.unwrap().text, "hello");
        assert_eq!(second_rx.recv().await.unwrap().text, "hello");
        // Exactly one copy each.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregistered_connection_receives_nothing() {
        let server = ChatServer::start();
        let (kept, mut kept_rx) = recording_connection();
        let (removed, mut removed_rx) = recording_connection();
        server.register(kept).await;
        server.register(removed.clone()).await;

        server.unregister(&removed).await;
        server
            .broadcast_sender()
            .send(ChatMessage::new("alice", "still here"))
            .await
            .unwrap();

        assert_eq!(kept_rx.recv().await.unwrap().text, "still here");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(removed_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_connection_does_not_stall_delivery_to_others() {
        let server = ChatServer::start();
        let (healthy, mut healthy_rx) = recording_connection();
        let (closed, _closed_rx) = recording_connection();
        closed.close();
        server.register(healthy).await;
        server.register(closed).await;

        server
            .broadcast_sender()
            .send(ChatMessage::new("alice", "onward"))
            .await
            .unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(1), healthy_rx.recv())
            .await
            .expect("delivery should not be blocked by the closed peer")
            .unwrap();
        assert_eq!(delivered.text, "onward");
    }

    #[tokio::test]
    async fn per_connection_order_matches_dispatch_order() {
        let server = ChatServer::start();
        let (conn, mut rx) = recording_connection();
        server.register(conn).await;

        let broadcast = server.broadcast_sender();
        for i in 0..10 {
            broadcast
                .send(ChatMessage::new("alice", format!("{}", i)))
                .await
                .unwrap();
        }

        for i in 0..10 {
            assert_eq!(rx.recv().await.unwrap().text, format!("{}", i));
        }
    }

    /// Connection whose writes succeed and vanish, for churn traffic
    /// where nobody asserts on delivery.
    fn discarding_connection() -> Arc<Connection> {
        let mut sink = MockMessageSink::new();
        sink.expect_send_message().returning(|_| Ok(()));
        Connection::spawn(sink)
    }

    #[tokio::test]
    async fn membership_churn_during_dispatch_is_safe() {
        let server = ChatServer::start();
        let (steady, mut steady_rx) = recording_connection();
        server.register(steady).await;

        // Register and unregister peers while a stream of broadcasts is
        // being dispatched.
        let churn = {
            let server = server.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let conn = discarding_connection();
                    server.register(conn.clone()).await;
                    tokio::task::yield_now().await;
                    server.unregister(&conn).await;
                }
            })
        };

        let broadcast = server.broadcast_sender();
        for i in 0..50 {
            broadcast
                .send(ChatMessage::new("alice", format!("m-{}", i)))
                .await
                .unwrap();
        }
        churn.await.expect("churn task should not panic");

        // The steady connection sees every message exactly once, in order.
        for i in 0..50 {
            assert_eq!(steady_rx.recv().await.unwrap().text, format!("m-{}", i));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(steady_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_closes_registered_connections() {
        let server = ChatServer::start();
        let (conn, _rx) = recording_connection();
        server.register(conn.clone()).await;

        server.shutdown().await;

        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn shutdown_stops_the_dispatcher() {
        let server = ChatServer::start();
        let (conn, mut rx) = recording_connection();
        server.register(conn).await;

        server.shutdown().await;
        // Give the dispatcher a moment to observe the cancellation, then
        // queue a message it should never deliver.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = server
            .broadcast_sender()
            .try_send(ChatMessage::new("alice", "dropped"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
