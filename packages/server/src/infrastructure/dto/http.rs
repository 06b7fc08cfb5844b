//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: i64,
    pub name: String,
    pub private: bool,
    pub created_by: i64,
    /// RFC 3339 (UTC)
    pub created_at: String,
    pub online: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListDto {
    pub rooms: Vec<RoomSummaryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListDto {
    pub room: String,
    pub messages: Vec<MessageDto>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceDto {
    pub room: String,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub code: String,
    pub message: String,
}
