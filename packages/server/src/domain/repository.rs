//! Repository trait 定義
//!
//! ドメイン層が必要とするルーム・メッセージストアのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ストアは永続的なメンバーシップとメッセージの唯一の正となるデータ源であり、
//! 複数の接続から同時に呼ばれても安全でなければなりません。

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, Identity, NewRoom, Room},
    error::RepositoryError,
    value_object::{MessageContent, RoomId, RoomName, UserId},
};

/// Room / Message Repository trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 名前でルームを取得（永続メンバーを含む）
    async fn find_room_by_name(&self, name: &RoomName) -> Result<Room, RepositoryError>;

    /// ユーザーがルームの永続メンバーかどうか
    async fn is_member(&self, name: &RoomName, user_id: UserId) -> Result<bool, RepositoryError>;

    /// メッセージを追加（ID とサーバー時刻を割り当てる）
    async fn append_message(
        &self,
        room_id: RoomId,
        author: &Identity,
        content: MessageContent,
    ) -> Result<ChatMessage, RepositoryError>;

    /// 最新 `limit` 件のメッセージを時刻昇順（同時刻は ID 順）で取得
    async fn recent_messages(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// ルームのメッセージ総数
    async fn count_messages(&self, room_id: RoomId) -> Result<usize, RepositoryError>;

    /// ルームを作成（作成者は永続メンバーになる）
    async fn create_room(&self, room: NewRoom) -> Result<Room, RepositoryError>;

    /// 永続メンバーを追加。既にメンバーなら `Ok(false)`
    async fn add_member(&self, name: &RoomName, user_id: UserId) -> Result<bool, RepositoryError>;

    /// 全ルームを取得
    async fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError>;
}
