//! MessagePusher trait 定義
//!
//! 接続へのイベント送信（通知）の抽象化。
//! 具体的な実装は Infrastructure 層（WebSocket）が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::MessagePushError,
    event::ServerEvent,
    value_object::{ConnectionId, MessageId},
};

/// Command delivered to a connection's writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(ServerEvent),
    /// Close the transport after everything queued before it
    Close,
}

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<Outbound>;

/// MessagePusher trait
///
/// ## 送信の種類
///
/// - `push_to`: 特定の接続への直接送信（保留中でも即時にキューへ入る）
/// - `broadcast`: ルームのピアへのファンアウト（保留中の接続ではバッファされる）
///
/// ## 保留（hold / release）
///
/// 認証直後の履歴リプレイ中に届いたブロードキャストを、リプレイの後に
/// 重複なく配送するための仕組みです。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除（保留中のバッファも破棄）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントをブロードキャスト（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 以降のブロードキャストをバッファする
    async fn hold(&self, connection_id: &ConnectionId);

    /// バッファを配送して保留を解除する
    ///
    /// `watermark` 以下の ID を持つ `NewMessage` は既にリプレイ済みなので捨てる。
    async fn release(&self, connection_id: &ConnectionId, watermark: Option<MessageId>);

    /// 接続を強制的に閉じる
    async fn close(&self, connection_id: &ConnectionId);
}
