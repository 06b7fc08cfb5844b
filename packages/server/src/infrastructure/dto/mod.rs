//! Data Transfer Objects (DTOs) for the chat gateway.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs (both directions)
//! - `http`: HTTP API request / response DTOs
//! - `conversion`: mapping from domain types

pub mod conversion;
pub mod http;
pub mod websocket;
