//! UseCase: メンバー向けのルーム照会（履歴・プレゼンス）

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ChatMessage, DisplayName, Identity, Presence, Room, RoomName, RoomRepository};

use super::error::GatewayError;

/// ルーム照会のユースケース
///
/// どの照会も永続メンバーに限られる。
pub struct QueryRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<Mutex<Presence>>,
    /// `limit` 未指定時の件数（兼上限）
    history_limit: usize,
}

impl QueryRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        presence: Arc<Mutex<Presence>>,
        history_limit: usize,
    ) -> Self {
        Self {
            repository,
            presence,
            history_limit,
        }
    }

    /// 直近のメッセージ（昇順）
    pub async fn messages(
        &self,
        viewer: &Identity,
        name: String,
        limit: Option<usize>,
    ) -> Result<(Room, Vec<ChatMessage>), GatewayError> {
        let room = self.member_room(viewer, name).await?;
        let limit = limit.unwrap_or(self.history_limit).clamp(1, self.history_limit);
        let messages = self.repository.recent_messages(room.id, limit).await?;
        Ok((room, messages))
    }

    /// 現在接続中の表示名（ソート済み）
    pub async fn presence(
        &self,
        viewer: &Identity,
        name: String,
    ) -> Result<(Room, Vec<DisplayName>), GatewayError> {
        let room = self.member_room(viewer, name).await?;
        let members = self.presence.lock().await.members(&room.name);
        Ok((room, members))
    }

    async fn member_room(&self, viewer: &Identity, name: String) -> Result<Room, GatewayError> {
        let name = RoomName::new(name)?;
        let room = self.repository.find_room_by_name(&name).await?;
        if !room.is_member(viewer.id) {
            return Err(GatewayError::Forbidden);
        }
        Ok(room)
    }
}
