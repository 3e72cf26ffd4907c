//! WebSocket chat relay server implementation.

mod chat;
mod connection;
mod handler;
mod registry;
mod runner;
mod signal;
mod transport;

pub use chat::{BROADCAST_QUEUE_CAPACITY, ChatServer};
pub use connection::{Connection, OUTBOUND_QUEUE_CAPACITY};
pub use registry::Registry;
pub use runner::{app, run_server};
pub use transport::{MessageSink, MessageStream};
