//! Outbound event vocabulary (server → client).
//!
//! Transport-neutral; `infrastructure::dto::websocket` maps these onto the
//! JSON wire format.

use super::{
    entity::{ChatMessage, Identity},
    value_object::{DisplayName, MessageId, RoomName},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Handshake accepted
    AuthSuccess { identity: Identity, room: RoomName },
    /// Most recent persisted messages, oldest first, sent once
    HistoryReplay { messages: Vec<ChatMessage> },
    PeerJoined { name: DisplayName, text: String },
    PeerLeft { name: DisplayName, text: String },
    /// Acknowledgement to the author
    MessageDelivered { message: ChatMessage },
    /// Fan-out to the other peers of the room
    NewMessage { message: ChatMessage },
    /// Sent to an evicted connection right before it is closed
    SessionReplaced { text: String },
    AuthError { code: &'static str, text: String },
    SendError { code: &'static str, text: String },
    HeartbeatAck,
}

impl ServerEvent {
    pub fn peer_joined(name: &DisplayName, room: &RoomName) -> Self {
        Self::PeerJoined {
            name: name.clone(),
            text: format!("{} joined {}", name, room),
        }
    }

    pub fn peer_left(name: &DisplayName, room: &RoomName) -> Self {
        Self::PeerLeft {
            name: name.clone(),
            text: format!("{} left {}", name, room),
        }
    }

    pub fn session_replaced() -> Self {
        Self::SessionReplaced {
            text: "Your session was replaced by a new connection".to_string(),
        }
    }

    /// Id of the carried message for live fan-out events
    pub fn live_message_id(&self) -> Option<MessageId> {
        match self {
            Self::NewMessage { message } => Some(message.id),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthSuccess { .. } => "auth_success",
            Self::HistoryReplay { .. } => "message_history",
            Self::PeerJoined { .. } => "user_joined",
            Self::PeerLeft { .. } => "user_left",
            Self::MessageDelivered { .. } => "message_sent",
            Self::NewMessage { .. } => "new_message",
            Self::SessionReplaced { .. } => "connection_replaced",
            Self::AuthError { .. } => "auth_error",
            Self::SendError { .. } => "send_error",
            Self::HeartbeatAck => "pong",
        }
    }
}
