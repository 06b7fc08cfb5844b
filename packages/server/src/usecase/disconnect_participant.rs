//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - プレゼンスからの削除と、残ったピアへの退出通知
//!
//! ### なぜこのテストが必要か
//! - 切断が冪等であることを保証（2 回目は何もしない）
//! - 新しいセッションに置き換えられた接続の後始末が、新しいエントリを消さないことを保証
//! - 最後の参加者が抜けたルームのインデックスが消えることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証済み接続の切断と通知
//! - エッジケース：未認証接続の切断、最後の参加者の切断、置き換え済み接続の切断

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Connection, MessagePusher, Presence, ServerEvent};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    presence: Arc<Mutex<Presence>>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>, presence: Arc<Mutex<Presence>>) -> Self {
        Self {
            message_pusher,
            presence,
        }
    }

    /// 参加者切断を実行
    ///
    /// 接続を Closed に遷移させ、認証済みだった場合はプレゼンスから外して
    /// 残ったピアに通知する。
    pub async fn execute(&self, connection: &mut Connection) {
        let connection_id = connection.id();
        let identity = connection.close();

        if let Some(identity) = identity {
            let departure = {
                let mut presence = self.presence.lock().await;
                presence.unregister(&identity.name, connection_id)
            };

            match departure {
                Some(departure) => {
                    tracing::info!(
                        "Connection '{}': '{}' left '{}'",
                        connection_id,
                        identity.name,
                        departure.room
                    );
                    let left = ServerEvent::peer_left(&identity.name, &departure.room);
                    if let Err(e) = self.message_pusher.broadcast(departure.notify, left).await {
                        tracing::warn!(
                            "Failed to announce departure from '{}': {}",
                            departure.room,
                            e
                        );
                    }
                }
                None => tracing::debug!(
                    "Connection '{}': session of '{}' already replaced",
                    connection_id,
                    identity.name
                ),
            }
        }

        self.message_pusher
            .unregister_connection(&connection_id)
            .await;
    }
}
