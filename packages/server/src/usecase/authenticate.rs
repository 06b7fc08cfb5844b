//! UseCase: 認証ハンドシェイク
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthenticateUseCase::execute() メソッド
//! - 資格情報の検証、ルームの解決、永続メンバーシップの確認、重複セッションの追い出し
//! - 認証成功後の通知順序（auth_success → message_history → 保留中のライブ配信）
//!
//! ### なぜこのテストが必要か
//! - 1 Identity につきライブセッションは最大 1 つという不変条件を保証する
//! - 失敗時にプレゼンスが一切変更されないことを保証する
//! - リプレイとライブ配信の間で重複も欠落も起きないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証成功、ピアへの参加通知
//! - 異常系：不正なトークン、存在しないルーム、非メンバー、ストア障害
//! - エッジケース：同一ルーム・別ルームからの再接続による追い出し、並行した同一 Identity の認証、
//!   ハンドシェイク中に届いたライブ配信（時計の巻き戻りを含む）、参加通知の配信失敗

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    Connection, Eviction, Identity, IdentityVerifier, LiveSession, MessagePusher, Presence,
    RoomRepository, ServerEvent,
};

use super::error::GatewayError;

/// 認証ハンドシェイクのユースケース
pub struct AuthenticateUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 資格情報の検証器
    verifier: Arc<dyn IdentityVerifier>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// ライブプレゼンス（セッションレジストリ + ルームインデックス）
    presence: Arc<Mutex<Presence>>,
    /// リプレイする履歴の最大件数
    history_limit: usize,
}

impl AuthenticateUseCase {
    /// 新しい AuthenticateUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        verifier: Arc<dyn IdentityVerifier>,
        message_pusher: Arc<dyn MessagePusher>,
        presence: Arc<Mutex<Presence>>,
        history_limit: usize,
    ) -> Self {
        Self {
            repository,
            verifier,
            message_pusher,
            presence,
            history_limit,
        }
    }

    /// 認証を実行
    ///
    /// # Arguments
    ///
    /// * `connection` - 未認証の接続（成功時に Authenticated へ遷移する）
    /// * `token` - クライアントが提示した資格情報
    ///
    /// # Returns
    ///
    /// * `Ok(Identity)` - 認証成功
    /// * `Err(GatewayError)` - 認証失敗（呼び出し側でエラー通知と切断を行う）
    pub async fn execute(
        &self,
        connection: &mut Connection,
        token: &str,
    ) -> Result<Identity, GatewayError> {
        let connection_id = connection.id();

        // 1. 資格情報の検証
        let identity = self.verifier.verify(token).await?;

        // 2. ルームの解決
        let room = self.repository.find_room_by_name(connection.room()).await?;

        // 3. 永続メンバーシップの確認
        if !self.repository.is_member(&room.name, identity.id).await? {
            tracing::warn!(
                "Connection '{}': '{}' is not a member of '{}'",
                connection_id,
                identity.name,
                room.name
            );
            return Err(GatewayError::Forbidden);
        }

        // 4. 登録前にブロードキャストを保留し、登録（と必要なら追い出し）を 1 つのクリティカルセクションで行う
        self.message_pusher.hold(&connection_id).await;
        let eviction = {
            let mut presence = self.presence.lock().await;
            presence.register(LiveSession {
                connection_id,
                identity: identity.clone(),
                room: room.name.clone(),
            })
        };
        // 同じルームでの置き換えではプレゼンスが途切れないので参加通知も出さない
        let rejoined = eviction
            .as_ref()
            .is_some_and(|e| e.session.room == room.name);
        if let Some(eviction) = eviction {
            self.evict(eviction).await;
        }

        // 5. 登録後のスナップショットから履歴を読む
        let history = match self
            .repository
            .recent_messages(room.id, self.history_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(
                    "Connection '{}': failed to load history of '{}' for '{}': {}",
                    connection_id,
                    room.name,
                    identity.name,
                    e
                );
                self.rollback(connection, &identity).await;
                return Err(e.into());
            }
        };

        connection.authenticate(identity.clone());
        tracing::info!(
            "Connection '{}': '{}' authenticated into '{}'",
            connection_id,
            identity.name,
            room.name
        );

        // 6. 認証成功の通知と履歴のリプレイ（保留をバイパスする直接送信）
        let watermark = history.iter().map(|message| message.id).max();
        let direct = [
            ServerEvent::AuthSuccess {
                identity: identity.clone(),
                room: room.name.clone(),
            },
            ServerEvent::HistoryReplay { messages: history },
        ];
        for event in direct {
            if let Err(e) = self.message_pusher.push_to(&connection_id, event).await {
                tracing::warn!("Connection '{}': {}", connection_id, e);
            }
        }

        // 7. リプレイ中に溜まったライブ配信を解放
        self.message_pusher.release(&connection_id, watermark).await;

        // 8. 他のピアへ参加を通知（ベストエフォート、登録は取り消さない）
        if !rejoined {
            let peers = {
                let presence = self.presence.lock().await;
                presence.peers(&room.name, Some(connection_id))
            };
            let joined = ServerEvent::peer_joined(&identity.name, &room.name);
            if let Err(e) = self.message_pusher.broadcast(peers, joined).await {
                tracing::warn!("Failed to announce arrival in '{}': {}", room.name, e);
            }
        }

        Ok(identity)
    }

    /// 以前のセッションを追い出す
    ///
    /// 通知はベストエフォート、切断は必ず行う。
    async fn evict(&self, eviction: Eviction) {
        let prior = eviction.session;
        tracing::info!(
            "Connection '{}': session of '{}' in '{}' replaced by a new connection",
            prior.connection_id,
            prior.identity.name,
            prior.room
        );

        if let Err(e) = self
            .message_pusher
            .push_to(&prior.connection_id, ServerEvent::session_replaced())
            .await
        {
            tracing::warn!(
                "Connection '{}': replaced notice not delivered: {}",
                prior.connection_id,
                e
            );
        }
        self.message_pusher.close(&prior.connection_id).await;

        if !eviction.notify.is_empty() {
            let left = ServerEvent::peer_left(&prior.identity.name, &prior.room);
            if let Err(e) = self.message_pusher.broadcast(eviction.notify, left).await {
                tracing::warn!("Failed to announce departure from '{}': {}", prior.room, e);
            }
        }
    }

    /// 登録済みのセッションを取り消す
    async fn rollback(&self, connection: &Connection, identity: &Identity) {
        let departure = {
            let mut presence = self.presence.lock().await;
            presence.unregister(&identity.name, connection.id())
        };
        self.message_pusher.release(&connection.id(), None).await;

        if let Some(departure) = departure.filter(|d| !d.notify.is_empty()) {
            let left = ServerEvent::peer_left(&identity.name, &departure.room);
            if let Err(e) = self.message_pusher.broadcast(departure.notify, left).await {
                tracing::warn!(
                    "Failed to announce departure from '{}': {}",
                    departure.room,
                    e
                );
            }
        }
    }
}
