//! Conversion logic between DTOs and domain types.

use agora_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatMessage, Identity, InboundEvent, Room, ServerEvent};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain
// ========================================

impl From<dto::ClientMessage> for InboundEvent {
    fn from(message: dto::ClientMessage) -> Self {
        match message {
            dto::ClientMessage::Auth { token } => InboundEvent::Authenticate { token },
            dto::ClientMessage::SendMessage { message } => {
                InboundEvent::SendMessage { content: message }
            }
            dto::ClientMessage::Ping => InboundEvent::Heartbeat,
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Identity> for dto::UserDto {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.value(),
            username: identity.name.to_string(),
            role: identity.role.as_str().to_string(),
        }
    }
}

impl From<ChatMessage> for dto::MessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            id: model.id.value(),
            content: model.content.into_string(),
            timestamp: timestamp_to_rfc3339(model.sent_at.value()),
            user_id: model.author_id.value(),
            username: model.author_name.into_string(),
        }
    }
}

impl From<ServerEvent> for dto::ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::AuthSuccess { identity, room } => Self::AuthSuccess {
                user: (&identity).into(),
                room: room.into_string(),
            },
            ServerEvent::HistoryReplay { messages } => Self::MessageHistory {
                messages: messages.into_iter().map(Into::into).collect(),
            },
            ServerEvent::PeerJoined { name, text } => Self::UserJoined {
                username: name.into_string(),
                message: text,
            },
            ServerEvent::PeerLeft { name, text } => Self::UserLeft {
                username: name.into_string(),
                message: text,
            },
            ServerEvent::MessageDelivered { message } => Self::MessageSent {
                message: message.into(),
            },
            ServerEvent::NewMessage { message } => Self::NewMessage {
                message: message.into(),
            },
            ServerEvent::SessionReplaced { text } => Self::ConnectionReplaced { message: text },
            ServerEvent::AuthError { code, text } => Self::AuthError {
                code: code.to_string(),
                message: text,
            },
            ServerEvent::SendError { code, text } => Self::SendError {
                code: code.to_string(),
                message: text,
            },
            ServerEvent::HeartbeatAck => Self::Pong,
        }
    }
}

/// Room listing entry; `online` comes from live presence
pub fn room_summary(room: &Room, online: usize) -> http::RoomSummaryDto {
    http::RoomSummaryDto {
        id: room.id.value(),
        name: room.name.to_string(),
        private: room.is_private,
        created_by: room.created_by.value(),
        created_at: timestamp_to_rfc3339(room.created_at.value()),
        online,
    }
}
