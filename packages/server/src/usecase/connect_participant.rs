//! UseCase: 参加者接続処理（トランスポート接続）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 未認証の Connection の生成と送信チャンネルの登録
//!
//! ### なぜこのテストが必要か
//! - 認証前の接続でもエラー通知を届けられることを保証
//! - 接続時点ではプレゼンスに何も登録されないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続
//! - エッジケース：同じルームへの複数の未認証接続

use std::sync::Arc;

use crate::domain::{Connection, MessagePusher, PusherChannel, RoomName};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `room` - 接続先のルーム（接続の生存期間中は固定）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// 未認証状態の Connection
    pub async fn execute(&self, room: RoomName, sender: PusherChannel) -> Connection {
        let connection = Connection::new(room);
        self.message_pusher
            .register_connection(connection.id(), sender)
            .await;
        tracing::info!(
            "Connection '{}' opened for room '{}'",
            connection.id(),
            connection.room()
        );
        connection
    }
}
