//! Request handlers.

mod http;
mod websocket;

pub use http::{create_room, health_check, join_room, list_rooms, room_messages, room_presence};
pub use websocket::websocket_handler;
