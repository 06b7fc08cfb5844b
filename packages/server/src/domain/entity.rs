//! Domain entities.

use std::collections::HashSet;

use super::value_object::{
    DisplayName, MessageContent, MessageId, Role, RoomId, RoomName, RoomSecret, Timestamp, UserId,
};

/// Authenticated principal attached to a connection
///
/// Loaded once from the verified credential and never re-fetched for the
/// life of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub name: DisplayName,
    pub role: Role,
}

impl Identity {
    pub fn new(id: UserId, name: DisplayName, role: Role) -> Self {
        Self { id, name, role }
    }
}

/// Persisted room
///
/// `members` is the authorization boundary: who may authenticate into the
/// room. Who is connected right now lives in [`super::Presence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    pub is_private: bool,
    pub secret: Option<RoomSecret>,
    pub members: HashSet<UserId>,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

impl Room {
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    /// Whether the room shows up in `user_id`'s room listing
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        !self.is_private || self.is_member(user_id)
    }

    /// Check a join attempt's secret; public rooms need none
    pub fn admits(&self, candidate: Option<&str>) -> bool {
        match (&self.secret, candidate) {
            (None, _) => true,
            (Some(secret), Some(candidate)) => secret.matches(candidate),
            (Some(_), None) => false,
        }
    }
}

/// Input for creating a room
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: RoomName,
    pub is_private: bool,
    pub secret: Option<RoomSecret>,
    pub created_by: UserId,
}

/// Persisted chat message, immutable after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author_id: UserId,
    pub author_name: DisplayName,
    pub content: MessageContent,
    pub sent_at: Timestamp,
}
