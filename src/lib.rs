//! WebSocket chat relay library.
//!
//! This library provides server and client implementations for a
//! WebSocket-based chat relay: every message a session sends is broadcast
//! to all currently connected sessions, including the sender.

pub mod client;
pub mod error;
pub mod message;
pub mod server;

// shared library
pub mod common;
