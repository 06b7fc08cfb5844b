//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

/// Client → server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth {
        #[serde(default)]
        token: Option<String>,
    },
    SendMessage {
        #[serde(alias = "content")]
        message: String,
    },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub content: String,
    /// RFC 3339 (UTC)
    pub timestamp: String,
    pub user_id: i64,
    pub username: String,
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthSuccess { user: UserDto, room: String },
    MessageHistory { messages: Vec<MessageDto> },
    UserJoined { username: String, message: String },
    UserLeft { username: String, message: String },
    MessageSent { message: MessageDto },
    NewMessage { message: MessageDto },
    ConnectionReplaced { message: String },
    AuthError { code: String, message: String },
    SendError { code: String, message: String },
    Pong,
}
