//! WebSocket chat gateway and room API (axum).

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, ServerConfig};
