//! WebSocket chat client implementation.

mod formatter;
mod runner;
mod session;

pub use runner::run_client;
