//! ドメイン層
//!
//! 値オブジェクト、エンティティ、接続ステートマシン、ライブプレゼンス、
//! そして外部コラボレーター（ストア、検証器、メッセージ送信）の trait を定義します。

pub mod connection;
pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod presence;
pub mod repository;
pub mod value_object;
pub mod verifier;

pub use connection::{Connection, ConnectionState, InboundEvent, Transition};
pub use entity::{ChatMessage, Identity, NewRoom, Room};
pub use error::{MessagePushError, RepositoryError, ValueObjectError, VerifyError};
pub use event::ServerEvent;
pub use message_pusher::{MessagePusher, Outbound, PusherChannel};
pub use presence::{Departure, Eviction, LiveSession, Presence};
pub use repository::RoomRepository;
pub use value_object::{
    ConnectionId, DisplayName, MessageContent, MessageId, Role, RoomId, RoomName, RoomSecret,
    Timestamp, UserId,
};
pub use verifier::IdentityVerifier;
