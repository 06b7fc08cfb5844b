//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `PusherChannel`（`UnboundedSender<Outbound>`）を管理
//! - 接続へのイベント送信（push_to, broadcast, close）
//! - 履歴リプレイ中のブロードキャストの保留と解放（hold, release）
//!
//! ## 設計ノート
//!
//! チャンネルの生成と WebSocket への書き込みは UI 層（`ui::handler::websocket`）で行われます。
//! この実装は生成された sender を受け取り、イベントの配送だけを担当します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MessageId, MessagePushError, MessagePusher, Outbound, PusherChannel,
    ServerEvent,
};

/// 接続ごとの送信先
struct Slot {
    sender: PusherChannel,
    /// `Some` の間はブロードキャストをここに溜める
    held: Option<Vec<ServerEvent>>,
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_connection(connection_id, tx).await;
/// pusher.push_to(&connection_id, ServerEvent::HeartbeatAck).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: ConnectionId, Value: 送信先
    slots: Mutex<HashMap<ConnectionId, Slot>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中の接続数
    pub async fn connection_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut slots = self.slots.lock().await;
        slots.insert(connection_id, Slot { sender, held: None });
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut slots = self.slots.lock().await;
        slots.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: ServerEvent,
    ) -> Result<(), MessagePushError> {
        let slots = self.slots.lock().await;
        let slot = slots
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;

        let name = event.name();
        slot.sender
            .send(Outbound::Event(event))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed '{}' to connection '{}'", name, connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: ServerEvent,
    ) -> Result<(), MessagePushError> {
        let mut slots = self.slots.lock().await;

        for target in targets {
            let Some(slot) = slots.get_mut(&target) else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    target
                );
                continue;
            };

            if let Some(held) = slot.held.as_mut() {
                held.push(event.clone());
                continue;
            }

            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = slot.sender.send(Outbound::Event(event.clone())) {
                tracing::warn!("Failed to push '{}' to '{}': {}", event.name(), target, e);
            }
        }

        Ok(())
    }

    async fn hold(&self, connection_id: &ConnectionId) {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get_mut(connection_id) {
            slot.held.get_or_insert_with(Vec::new);
        }
    }

    async fn release(&self, connection_id: &ConnectionId, watermark: Option<MessageId>) {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get_mut(connection_id) else {
            return;
        };
        let Some(held) = slot.held.take() else {
            return;
        };

        let mut skipped = 0usize;
        for event in held {
            let replayed = match (event.live_message_id(), watermark) {
                (Some(id), Some(mark)) => id <= mark,
                _ => false,
            };
            if replayed {
                skipped += 1;
                continue;
            }
            if slot.sender.send(Outbound::Event(event)).is_err() {
                break;
            }
        }
        if skipped > 0 {
            tracing::debug!(
                "Dropped {} held message(s) already covered by replay for '{}'",
                skipped,
                connection_id
            );
        }
    }

    async fn close(&self, connection_id: &ConnectionId) {
        let slots = self.slots.lock().await;
        match slots.get(connection_id) {
            Some(slot) => {
                if slot.sender.send(Outbound::Close).is_err() {
                    tracing::debug!("Connection '{}' already gone", connection_id);
                }
            }
            None => tracing::debug!("Close requested for unknown '{}'", connection_id),
        }
    }
}
