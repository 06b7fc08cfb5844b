//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap / Vec をインメモリ DB として使用します。
//!
//! ID は挿入順に単調増加で割り当て、メッセージの時刻は注入された `Clock` から取得します。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use agora_shared::time::Clock;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, Identity, MessageContent, MessageId, NewRoom, RepositoryError, Room, RoomId,
    RoomName, RoomRepository, Timestamp, UserId,
};

#[derive(Default)]
struct Tables {
    rooms: HashMap<RoomName, Room>,
    messages: Vec<ChatMessage>,
    last_room_id: i64,
    last_message_id: i64,
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find_room_by_name(&self, name: &RoomName) -> Result<Room, RepositoryError> {
        let tables = self.tables.lock().await;
        tables
            .rooms
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(name.to_string()))
    }

    async fn is_member(&self, name: &RoomName, user_id: UserId) -> Result<bool, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rooms
            .get(name)
            .is_some_and(|room| room.is_member(user_id)))
    }

    async fn append_message(
        &self,
        room_id: RoomId,
        author: &Identity,
        content: MessageContent,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.rooms.values().any(|room| room.id == room_id) {
            return Err(RepositoryError::RoomNotFound(room_id.value().to_string()));
        }

        tables.last_message_id += 1;
        let message = ChatMessage {
            id: MessageId::new(tables.last_message_id),
            room_id,
            author_id: author.id,
            author_name: author.name.clone(),
            content,
            sent_at: Timestamp::new(self.clock.now_millis()),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn recent_messages(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut messages: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.sent_at, m.id));

        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    async fn count_messages(&self, room_id: RoomId) -> Result<usize, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .count())
    }

    async fn create_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.rooms.contains_key(&room.name) {
            return Err(RepositoryError::RoomAlreadyExists(room.name.to_string()));
        }

        tables.last_room_id += 1;
        let created = Room {
            id: RoomId::new(tables.last_room_id),
            name: room.name,
            is_private: room.is_private,
            secret: room.secret,
            members: HashSet::from([room.created_by]),
            created_by: room.created_by,
            created_at: Timestamp::new(self.clock.now_millis()),
        };
        tables.rooms.insert(created.name.clone(), created.clone());
        Ok(created)
    }

    async fn add_member(&self, name: &RoomName, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let room = tables
            .rooms
            .get_mut(name)
            .ok_or_else(|| RepositoryError::RoomNotFound(name.to_string()))?;
        Ok(room.members.insert(user_id))
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut rooms: Vec<Room> = tables.rooms.values().cloned().collect();
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Role, RoomSecret};
    use agora_shared::time::{FixedClock, SystemClock};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository のルーム作成・メンバー管理・メッセージ追加と取得
    //
    // 【なぜこのテストが必要か】
    // - 履歴リプレイの順序（時刻昇順、同時刻は ID 順）と件数上限はプロトコルの保証
    // - 作成者が永続メンバーになることは認証ルールの前提
    //
    // 【どのようなシナリオをテストするか】
    // 1. ルーム作成と重複作成
    // 2. メンバー追加（新規・既存・存在しないルーム）
    // 3. メッセージ追加と最新 N 件の取得
    // 4. 同時刻メッセージの ID 順
    // ========================================

    fn create_test_repository() -> InMemoryRoomRepository {
        InMemoryRoomRepository::new(Arc::new(SystemClock))
    }

    fn name(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    fn identity(id: i64, display_name: &str) -> Identity {
        Identity::new(
            UserId::new(id),
            DisplayName::new(display_name.to_string()).unwrap(),
            Role::User,
        )
    }

    fn new_room(room_name: &str, created_by: i64) -> NewRoom {
        NewRoom {
            name: name(room_name),
            is_private: false,
            secret: None,
            created_by: UserId::new(created_by),
        }
    }

    #[tokio::test]
    async fn test_create_room_makes_creator_member() {
        // テスト項目: ルーム作成時に作成者が永続メンバーになる
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let room = repo.create_room(new_room("general", 1)).await.unwrap();

        // then (期待する結果):
        assert_eq!(room.id, RoomId::new(1));
        assert!(repo.is_member(&name("general"), UserId::new(1)).await.unwrap());
        assert!(!repo.is_member(&name("general"), UserId::new(2)).await.unwrap());
        let found = repo.find_room_by_name(&name("general")).await.unwrap();
        assert_eq!(found, room);
    }

    #[tokio::test]
    async fn test_create_duplicate_room_fails() {
        // テスト項目: 同名のルームは作成できない
        // given (前提条件):
        let repo = create_test_repository();
        repo.create_room(new_room("general", 1)).await.unwrap();

        // when (操作):
        let result = repo.create_room(new_room("general", 2)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::RoomAlreadyExists("general".to_string()))
        );
    }

    #[tokio::test]
    async fn test_private_room_keeps_secret_digest() {
        // テスト項目: プライベートルームのシークレットが保持され照合できる
        // given (前提条件):
        let repo = create_test_repository();
        let mut input = new_room("secret-club", 1);
        input.is_private = true;
        input.secret = Some(RoomSecret::from_plain("pw").unwrap());

        // when (操作):
        repo.create_room(input).await.unwrap();
        let room = repo.find_room_by_name(&name("secret-club")).await.unwrap();

        // then (期待する結果):
        assert!(room.is_private);
        assert!(room.admits(Some("pw")));
    }

    #[tokio::test]
    async fn test_add_member() {
        // テスト項目: メンバー追加は新規なら true、既存なら false、ルームがなければエラー
        // given (前提条件):
        let repo = create_test_repository();
        repo.create_room(new_room("general", 1)).await.unwrap();

        // when (操作):
        let added = repo.add_member(&name("general"), UserId::new(2)).await;
        let again = repo.add_member(&name("general"), UserId::new(2)).await;
        let missing = repo.add_member(&name("nowhere"), UserId::new(2)).await;

        // then (期待する結果):
        assert_eq!(added, Ok(true));
        assert_eq!(again, Ok(false));
        assert!(matches!(missing, Err(RepositoryError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_missing_room() {
        // テスト項目: 存在しないルームの取得は RoomNotFound
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let result = repo.find_room_by_name(&name("nowhere")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::RoomNotFound("nowhere".to_string())));
    }

    #[tokio::test]
    async fn test_recent_messages_returns_latest_in_ascending_order() {
        // テスト項目: 最新 N 件が時刻昇順で返され、他のルームのメッセージは含まれない
        // given (前提条件):
        let repo = create_test_repository();
        let general = repo.create_room(new_room("general", 1)).await.unwrap();
        let random = repo.create_room(new_room("random", 1)).await.unwrap();
        let alice = identity(1, "alice");
        for i in 0..5 {
            let content = MessageContent::new(format!("msg {}", i)).unwrap();
            repo.append_message(general.id, &alice, content).await.unwrap();
        }
        let other = MessageContent::new("elsewhere".to_string()).unwrap();
        repo.append_message(random.id, &alice, other).await.unwrap();

        // when (操作):
        let recent = repo.recent_messages(general.id, 3).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 2", "msg 3", "msg 4"]);
        assert!(recent.windows(2).all(|w| (w[0].sent_at, w[0].id) < (w[1].sent_at, w[1].id)));
        assert_eq!(repo.count_messages(general.id).await.unwrap(), 5);
        assert_eq!(repo.count_messages(random.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_recent_messages_breaks_timestamp_ties_by_id() {
        // テスト項目: 同時刻のメッセージは挿入（ID）順に並ぶ
        // given (前提条件):
        let repo = InMemoryRoomRepository::new(Arc::new(FixedClock::new(1_000)));
        let room = repo.create_room(new_room("general", 1)).await.unwrap();
        let alice = identity(1, "alice");
        for body in ["first", "second", "third"] {
            let content = MessageContent::new(body.to_string()).unwrap();
            repo.append_message(room.id, &alice, content).await.unwrap();
        }

        // when (操作):
        let all = repo.recent_messages(room.id, 50).await.unwrap();

        // then (期待する結果):
        let ids: Vec<i64> = all.iter().map(|m| m.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(all.iter().all(|m| m.sent_at == Timestamp::new(1_000)));
    }

    #[tokio::test]
    async fn test_append_message_to_unknown_room_fails() {
        // テスト項目: 存在しないルームへのメッセージ追加はエラーになり保存されない
        // given (前提条件):
        let repo = create_test_repository();
        let alice = identity(1, "alice");

        // when (操作):
        let content = MessageContent::new("hello".to_string()).unwrap();
        let result = repo.append_message(RoomId::new(42), &alice, content).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::RoomNotFound(_))));
        assert_eq!(repo.count_messages(RoomId::new(42)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_rooms_in_creation_order() {
        // テスト項目: ルーム一覧は作成順に返される
        // given (前提条件):
        let repo = create_test_repository();
        repo.create_room(new_room("zeta", 1)).await.unwrap();
        repo.create_room(new_room("alpha", 1)).await.unwrap();

        // when (操作):
        let rooms = repo.list_rooms().await.unwrap();

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
