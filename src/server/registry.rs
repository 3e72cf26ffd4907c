//! Registry of live connections.
//!
//! The registry is the only shared mutable structure in the relay. Its
//! lock is held just long enough to insert, remove, or copy the member
//! list; it is never held across a message delivery.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use uuid::Uuid;

use super::connection::Connection;

/// Map of session id to live connection. A connection is present iff it
/// is eligible to receive broadcasts.
#[derive(Default)]
pub struct Registry {
    connections: Mutex<HashMap<Uuid, Arc<Connection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Called from exactly one place, right after the
    /// connection is created, so a duplicate id indicates a bug.
    pub async fn register(&self, conn: Arc<Connection>) {
        let mut connections = self.connections.lock().await;
        let replaced = connections.insert(conn.id(), conn);
        debug_assert!(replaced.is_none(), "duplicate session id registered");
    }

    /// Remove a connection. Idempotent: removing an absent id is a no-op.
    /// Returns whether the connection was still present.
    pub async fn unregister(&self, id: Uuid) -> bool {
        let mut connections = self.connections.lock().await;
        connections.remove(&id).is_some()
    }

    /// Consistent copy of the current membership, for fan-out outside the
    /// lock.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        let connections = self.connections.lock().await;
        connections.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::super::transport::MockMessageSink;
    use super::*;

    fn idle_connection() -> Arc<Connection> {
        let mut sink = MockMessageSink::new();
        sink.expect_send_message().returning(|_| Ok(()));
        Connection::spawn(sink)
    }

    #[tokio::test]
    async fn register_makes_a_connection_visible_in_snapshots() {
        let registry = Registry::new();
        let conn = idle_connection();

        registry.register(conn.clone()).await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), conn.id());
    }

    #[tokio::test]
    async fn unregister_removes_exactly_once() {
        let registry = Registry::new();
        let conn = idle_connection();
        registry.register(conn.clone()).await;

        assert!(registry.unregister(conn.id()).await);
        assert!(!registry.unregister(conn.id()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_membership_changes() {
        let registry = Registry::new();
        let first = idle_connection();
        let second = idle_connection();
        registry.register(first.clone()).await;
        registry.register(second.clone()).await;

        let snapshot = registry.snapshot().await;
        registry.unregister(first.id()).await;

        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len().await, 1);
    }
}
