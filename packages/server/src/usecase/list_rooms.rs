//! UseCase: 見えるルームの一覧

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Identity, Presence, Room, RoomRepository};

use super::error::GatewayError;

/// ルーム一覧の 1 行（ライブ接続数付き）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room: Room,
    pub online: usize,
}

/// 公開ルームと、呼び出し元がメンバーの非公開ルームを返す
pub struct ListRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<Mutex<Presence>>,
}

impl ListRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, presence: Arc<Mutex<Presence>>) -> Self {
        Self {
            repository,
            presence,
        }
    }

    pub async fn execute(&self, viewer: &Identity) -> Result<Vec<RoomSummary>, GatewayError> {
        let rooms = self.repository.list_rooms().await?;
        let presence = self.presence.lock().await;

        Ok(rooms
            .into_iter()
            .filter(|room| room.is_visible_to(viewer.id))
            .map(|room| RoomSummary {
                online: presence.online_count(&room.name),
                room,
            })
            .collect())
    }
}
