//! Agora terminal client.
//!
//! Connects to a room over WebSocket, authenticates with a bearer token and
//! relays stdin lines as chat messages.

pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
