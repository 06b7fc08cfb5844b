//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - メッセージの永続化、送信者への確認応答、他のピアへのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 送信者自身には new_message が届かない（ローカルエコーの重複防止）
//! - 永続化に失敗したメッセージがブロードキャストされないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト
//! - 異常系：ストア障害
//! - エッジケース：送信者のみが接続している場合、追い出し済みの接続からの送信

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, Identity, MessageContent, MessagePusher, Presence, RoomName,
    RoomRepository, ServerEvent,
};

use super::error::GatewayError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    presence: Arc<Mutex<Presence>>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        presence: Arc<Mutex<Presence>>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            presence,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信元の接続
    /// * `room` - 接続先のルーム
    /// * `author` - 送信者の Identity
    /// * `content` - 検証済みのメッセージ内容
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 永続化されたメッセージ
    /// * `Err(GatewayError)` - 送信失敗（ブロードキャストは行われない）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room: &RoomName,
        author: &Identity,
        content: MessageContent,
    ) -> Result<ChatMessage, GatewayError> {
        // 1. 追い出し済みの接続からの送信は受け付けない
        let holds_session = {
            let presence = self.presence.lock().await;
            presence
                .session(&author.name)
                .is_some_and(|s| s.connection_id == connection_id)
        };
        if !holds_session {
            return Err(GatewayError::Unauthorized);
        }

        // 2. 永続化
        let stored = self.repository.find_room_by_name(room).await?;
        let message = self
            .repository
            .append_message(stored.id, author, content)
            .await?;

        // 3. 送信者への確認応答
        if let Err(e) = self
            .message_pusher
            .push_to(
                &connection_id,
                ServerEvent::MessageDelivered {
                    message: message.clone(),
                },
            )
            .await
        {
            tracing::warn!("Connection '{}': {}", connection_id, e);
        }

        // 4. 送信者以外のピアへブロードキャスト
        let peers = {
            let presence = self.presence.lock().await;
            presence.peers(room, Some(connection_id))
        };
        tracing::debug!(
            "Message {} from '{}' in '{}' fanned out to {} peer(s)",
            message.id.value(),
            author.name,
            room,
            peers.len()
        );
        if let Err(e) = self
            .message_pusher
            .broadcast(
                peers,
                ServerEvent::NewMessage {
                    message: message.clone(),
                },
            )
            .await
        {
            tracing::warn!(
                "Message {} in '{}' not fanned out: {}",
                message.id.value(),
                room,
                e
            );
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{LiveSession, Outbound, RepositoryError, repository::MockRoomRepository},
        usecase::test_support::{
            BroadcastFailingPusher, Fixture, drain, events, identity, room_name,
        },
    };

    async fn go_live(fixture: &Fixture, who: &Identity, room: &str) -> (ConnectionId, tokio::sync::mpsc::UnboundedReceiver<Outbound>) {
        let (conn, rx) = fixture.open(room).await;
        fixture.presence.lock().await.register(LiveSession {
            connection_id: conn.id(),
            identity: who.clone(),
            room: room_name(room),
        });
        (conn.id(), rx)
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_success() {
        // テスト項目: 送信者に message_sent、他のピアに new_message が届き、ストアに 1 行追加される
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let charlie = identity(3, "charlie");
        let room = fixture
            .room_with_members("general", &[&alice, &bob, &charlie])
            .await;
        let (alice_id, mut alice_rx) = go_live(&fixture, &alice, "general").await;
        let (_, mut bob_rx) = go_live(&fixture, &bob, "general").await;
        let (_, mut charlie_rx) = go_live(&fixture, &charlie, "general").await;
        let usecase = SendMessageUseCase::new(
            fixture.repository.clone(),
            fixture.pusher.clone(),
            fixture.presence.clone(),
        );

        // when (操作):
        let result = usecase
            .execute(alice_id, &room_name("general"), &alice, content("hello"))
            .await;

        // then (期待する結果):
        let message = result.unwrap();
        assert_eq!(message.author_name, alice.name);
        assert_eq!(
            events(drain(&mut alice_rx)),
            vec![ServerEvent::MessageDelivered {
                message: message.clone()
            }]
        );
        for rx in [&mut bob_rx, &mut charlie_rx] {
            assert_eq!(
                events(drain(rx)),
                vec![ServerEvent::NewMessage {
                    message: message.clone()
                }]
            );
        }
        assert_eq!(fixture.repository.count_messages(room.id).await, Ok(1));
    }

    #[tokio::test]
    async fn test_send_message_alone_in_room() {
        // テスト項目: 送信者しかいないルームでも確認応答だけが届く
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice");
        fixture.room_with_members("general", &[&alice]).await;
        let (alice_id, mut alice_rx) = go_live(&fixture, &alice, "general").await;
        let usecase = SendMessageUseCase::new(
            fixture.repository.clone(),
            fixture.pusher.clone(),
            fixture.presence.clone(),
        );

        // when (操作):
        let result = usecase
            .execute(alice_id, &room_name("general"), &alice, content("anyone?"))
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(drain(&mut alice_rx).len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_store_failure_is_not_broadcast() {
        // テスト項目: 永続化に失敗したメッセージは Internal になり、誰にも配信されない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let room = fixture.room_with_members("general", &[&alice, &bob]).await;
        let (alice_id, mut alice_rx) = go_live(&fixture, &alice, "general").await;
        let (_, mut bob_rx) = go_live(&fixture, &bob, "general").await;

        let mut repository = MockRoomRepository::new();
        repository
            .expect_find_room_by_name()
            .returning(move |_| Ok(room.clone()));
        repository
            .expect_append_message()
            .returning(|_, _, _| Err(RepositoryError::Unavailable("locked".to_string())));
        let usecase = SendMessageUseCase::new(
            Arc::new(repository),
            fixture.pusher.clone(),
            fixture.presence.clone(),
        );

        // when (操作):
        let result = usecase
            .execute(alice_id, &room_name("general"), &alice, content("hello"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(GatewayError::Internal("locked".to_string())));
        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn test_send_from_replaced_connection_is_refused() {
        // テスト項目: 新しいセッションに置き換えられた接続からの送信は拒否され、永続化されない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice");
        let room = fixture.room_with_members("general", &[&alice]).await;
        let (stale_id, _stale_rx) = go_live(&fixture, &alice, "general").await;
        let (_fresh_id, _fresh_rx) = go_live(&fixture, &alice, "general").await;
        let usecase = SendMessageUseCase::new(
            fixture.repository.clone(),
            fixture.pusher.clone(),
            fixture.presence.clone(),
        );

        // when (操作):
        let result = usecase
            .execute(stale_id, &room_name("general"), &alice, content("ghost"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(GatewayError::Unauthorized));
        assert_eq!(fixture.repository.count_messages(room.id).await, Ok(0));
    }

    #[tokio::test]
    async fn test_fan_out_failure_still_returns_stored_message() {
        // テスト項目: ピアへの配信に失敗しても、保存済みのメッセージは送信者に message_sent として確定する
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice");
        let bob = identity(2, "bob");
        let room = fixture.room_with_members("general", &[&alice, &bob]).await;
        let (alice_id, mut alice_rx) = go_live(&fixture, &alice, "general").await;
        let (_, _bob_rx) = go_live(&fixture, &bob, "general").await;
        let usecase = SendMessageUseCase::new(
            fixture.repository.clone(),
            Arc::new(BroadcastFailingPusher(fixture.pusher.clone())),
            fixture.presence.clone(),
        );

        // when (操作):
        let result = usecase
            .execute(alice_id, &room_name("general"), &alice, content("hello"))
            .await;

        // then (期待する結果):
        let message = result.unwrap();
        assert_eq!(
            events(drain(&mut alice_rx)),
            vec![ServerEvent::MessageDelivered { message }]
        );
        assert_eq!(fixture.repository.count_messages(room.id).await, Ok(1));
    }
}
