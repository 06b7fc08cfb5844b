//! UseCase テスト用の共通ヘルパー

use std::{collections::HashMap, sync::Arc};

use agora_shared::time::SystemClock;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        Connection, ConnectionId, DisplayName, Identity, MessageId, MessagePushError,
        MessagePusher, NewRoom, Outbound, Presence, PusherChannel, Role, Room, RoomName,
        RoomRepository, ServerEvent, UserId, VerifyError, verifier::MockIdentityVerifier,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
    },
};

pub fn identity(id: i64, name: &str) -> Identity {
    Identity::new(
        UserId::new(id),
        DisplayName::new(name.to_string()).unwrap(),
        Role::User,
    )
}

pub fn room_name(name: &str) -> RoomName {
    RoomName::new(name.to_string()).unwrap()
}

/// トークン文字列 = ユーザー名 として検証するモック
pub fn verifier_for(identities: &[&Identity]) -> MockIdentityVerifier {
    let known: HashMap<String, Identity> = identities
        .iter()
        .map(|i| (i.name.to_string(), (*i).clone()))
        .collect();
    let mut verifier = MockIdentityVerifier::new();
    verifier
        .expect_verify()
        .returning(move |token: &str| known.get(token).cloned().ok_or(VerifyError::Invalid));
    verifier
}

pub struct Fixture {
    pub repository: Arc<InMemoryRoomRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub presence: Arc<Mutex<Presence>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryRoomRepository::new(Arc::new(SystemClock))),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            presence: Arc::new(Mutex::new(Presence::new())),
        }
    }

    /// 公開ルームを作成し、`members` を永続メンバーにする
    pub async fn room_with_members(&self, name: &str, members: &[&Identity]) -> Room {
        let room = self
            .repository
            .create_room(NewRoom {
                name: room_name(name),
                is_private: false,
                secret: None,
                created_by: UserId::new(0),
            })
            .await
            .unwrap();
        for member in members {
            self.repository
                .add_member(&room.name, member.id)
                .await
                .unwrap();
        }
        room
    }

    /// ルームへの接続を開き、送信チャンネルを登録する
    pub async fn open(&self, room: &str) -> (Connection, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection::new(room_name(room));
        self.pusher.register_connection(connection.id(), tx).await;
        (connection, rx)
    }
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

/// 受信したイベントの名前だけを取り出す（Close は "close"）
pub fn names(outbound: &[Outbound]) -> Vec<&'static str> {
    outbound
        .iter()
        .map(|o| match o {
            Outbound::Event(event) => event.name(),
            Outbound::Close => "close",
        })
        .collect()
}

pub fn events(outbound: Vec<Outbound>) -> Vec<ServerEvent> {
    outbound
        .into_iter()
        .filter_map(|o| match o {
            Outbound::Event(event) => Some(event),
            Outbound::Close => None,
        })
        .collect()
}

/// ブロードキャストだけが失敗する MessagePusher（それ以外は委譲）
pub struct BroadcastFailingPusher(pub Arc<WebSocketMessagePusher>);

#[async_trait]
impl MessagePusher for BroadcastFailingPusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.0.register_connection(connection_id, sender).await;
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        self.0.unregister_connection(connection_id).await;
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: ServerEvent,
    ) -> Result<(), MessagePushError> {
        self.0.push_to(connection_id, event).await
    }

    async fn broadcast(
        &self,
        _targets: Vec<ConnectionId>,
        _event: ServerEvent,
    ) -> Result<(), MessagePushError> {
        Err(MessagePushError::PushFailed("peer channel closed".to_string()))
    }

    async fn hold(&self, connection_id: &ConnectionId) {
        self.0.hold(connection_id).await;
    }

    async fn release(&self, connection_id: &ConnectionId, watermark: Option<MessageId>) {
        self.0.release(connection_id, watermark).await;
    }

    async fn close(&self, connection_id: &ConnectionId) {
        self.0.close(connection_id).await;
    }
}
