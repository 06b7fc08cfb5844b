//! UseCase 層
//!
//! ドメインのルールとコラボレーター（ストア・検証器・メッセージ送信）を組み合わせて、
//! ゲートウェイと HTTP API の各操作を実装します。

pub mod authenticate;
pub mod connect_participant;
pub mod create_room;
pub mod disconnect_participant;
pub mod error;
pub mod gateway;
pub mod join_room;
pub mod list_rooms;
pub mod query_room;
pub mod send_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticate::AuthenticateUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use join_room::JoinRoomUseCase;
pub use list_rooms::{ListRoomsUseCase, RoomSummary};
pub use query_room::QueryRoomUseCase;
pub use send_message::SendMessageUseCase;
