//! UseCase: ルーム作成
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CreateRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 作成者が永続メンバーになることを保証（作成直後に WebSocket で入室できる）
//! - 公開・非公開ルームと秘密の組み合わせの検証
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開ルーム、非公開ルームの作成
//! - 異常系：重複したルーム名、不正なルーム名、秘密の指定ミス

use std::sync::Arc;

use crate::domain::{Identity, NewRoom, Room, RoomName, RoomRepository, RoomSecret};

use super::error::GatewayError;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルームを作成し、作成者をメンバーにする
    pub async fn execute(
        &self,
        creator: &Identity,
        name: String,
        is_private: bool,
        password: Option<String>,
    ) -> Result<Room, GatewayError> {
        let name = RoomName::new(name)?;
        let secret = match (is_private, password) {
            (true, Some(password)) => Some(RoomSecret::from_plain(&password)?),
            (true, None) => {
                return Err(GatewayError::Invalid(
                    "Private rooms require a password".to_string(),
                ));
            }
            (false, Some(_)) => {
                return Err(GatewayError::Invalid(
                    "Public rooms cannot have a password".to_string(),
                ));
            }
            (false, None) => None,
        };

        let room = self
            .repository
            .create_room(NewRoom {
                name,
                is_private,
                secret,
                created_by: creator.id,
            })
            .await?;
        tracing::info!(
            "Room '{}' created by '{}' (private: {})",
            room.name,
            creator.name,
            room.is_private
        );
        Ok(room)
    }
}
