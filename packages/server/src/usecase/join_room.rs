//! UseCase: ルームへの参加（永続メンバーシップの登録）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 非公開ルームの秘密の検証を保証
//! - 既にメンバーである場合は致命的でない Conflict になることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開ルームへの参加、正しい秘密での非公開ルームへの参加
//! - 異常系：秘密の誤り、存在しないルーム
//! - エッジケース：既にメンバー

use std::sync::Arc;

use crate::domain::{Identity, Room, RoomName, RoomRepository};

use super::error::GatewayError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 秘密を検証して永続メンバーに加える
    pub async fn execute(
        &self,
        identity: &Identity,
        name: String,
        password: Option<String>,
    ) -> Result<Room, GatewayError> {
        let name = RoomName::new(name)?;
        let room = self.repository.find_room_by_name(&name).await?;

        if room.is_member(identity.id) {
            return Err(GatewayError::Conflict(format!(
                "Already a member of '{}'",
                room.name
            )));
        }
        if !room.admits(password.as_deref()) {
            tracing::warn!("'{}' gave a wrong secret for '{}'", identity.name, room.name);
            return Err(GatewayError::Forbidden);
        }

        if !self.repository.add_member(&room.name, identity.id).await? {
            return Err(GatewayError::Conflict(format!(
                "Already a member of '{}'",
                room.name
            )));
        }
        tracing::info!("'{}' joined room '{}'", identity.name, room.name);

        Ok(self.repository.find_room_by_name(&room.name).await?)
    }
}
