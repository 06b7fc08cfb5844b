//! Agora: room-based real-time chat server library.
//!
//! Clients authenticate over an already-open WebSocket, join a single named
//! room per connection, exchange persisted messages and receive live updates.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
