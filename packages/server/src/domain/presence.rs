//! Live presence: the session registry and the room membership index.
//!
//! Both maps live in one value so that a caller holding a single lock gets
//! lookup + evict + insert as one critical section. Nothing here is
//! persisted; a restart starts from [`Presence::default`].
//!
//! Invariants:
//! - at most one [`LiveSession`] per display name;
//! - a name is in a room's live set iff its live session targets that room;
//! - no room keeps an empty live set.

use std::collections::HashMap;

use super::{
    entity::Identity,
    value_object::{ConnectionId, DisplayName, RoomName},
};

/// An authenticated connection as seen by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub room: RoomName,
}

/// A prior session displaced by a newer one for the same identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub session: LiveSession,
    /// Peers of the old room to notify of the departure.
    /// Empty when the new session targets the same room.
    pub notify: Vec<ConnectionId>,
}

/// Result of removing a live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomName,
    /// Remaining peers of the room
    pub notify: Vec<ConnectionId>,
}

#[derive(Debug, Default)]
pub struct Presence {
    sessions: HashMap<DisplayName, LiveSession>,
    rooms: HashMap<RoomName, HashMap<DisplayName, ConnectionId>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `session`, evicting any prior session of the same identity
    pub fn register(&mut self, session: LiveSession) -> Option<Eviction> {
        let name = session.identity.name.clone();

        let eviction = self.sessions.remove(&name).map(|prior| {
            self.leave_room(&prior.room, &name, prior.connection_id);
            let notify = if prior.room == session.room {
                Vec::new()
            } else {
                self.peers(&prior.room, None)
            };
            Eviction {
                session: prior,
                notify,
            }
        });

        self.rooms
            .entry(session.room.clone())
            .or_default()
            .insert(name.clone(), session.connection_id);
        self.sessions.insert(name, session);

        eviction
    }

    /// Remove the session of `name` if, and only if, it still belongs to
    /// `connection_id`
    ///
    /// A connection that was already replaced by a newer session gets `None`
    /// and leaves the newer entry alone.
    pub fn unregister(
        &mut self,
        name: &DisplayName,
        connection_id: ConnectionId,
    ) -> Option<Departure> {
        let owned = self
            .sessions
            .get(name)
            .is_some_and(|s| s.connection_id == connection_id);
        if !owned {
            return None;
        }

        let session = self.sessions.remove(name)?;
        self.leave_room(&session.room, name, connection_id);
        Some(Departure {
            notify: self.peers(&session.room, None),
            room: session.room,
        })
    }

    /// Live connections of `room`, optionally excluding one
    pub fn peers(&self, room: &RoomName, exclude: Option<ConnectionId>) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| {
                members
                    .values()
                    .copied()
                    .filter(|id| Some(*id) != exclude)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Display names currently connected to `room`, sorted
    pub fn members(&self, room: &RoomName) -> Vec<DisplayName> {
        let mut names: Vec<DisplayName> = self
            .rooms
            .get(room)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn session(&self, name: &DisplayName) -> Option<&LiveSession> {
        self.sessions.get(name)
    }

    pub fn is_tracking(&self, room: &RoomName) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn online_count(&self, room: &RoomName) -> usize {
        self.rooms.get(room).map_or(0, HashMap::len)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn leave_room(&mut self, room: &RoomName, name: &DisplayName, connection_id: ConnectionId) {
        if let Some(members) = self.rooms.get_mut(room) {
            if members.get(name) == Some(&connection_id) {
                members.remove(name);
            }
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{Role, UserId};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - セッション登録（同一 identity の置き換え）と登録解除
    // - ルームのライブ集合と登録済みセッションの整合性
    //
    // 【なぜこのテストが必要か】
    // - 1 identity 1 セッションの保証はプロトコルの中核
    // - 置き換えられた古い接続のクリーンアップが新しいエントリを消してはならない
    //
    // 【どのようなシナリオをテストするか】
    // 1. 初回登録とピア取得
    // 2. 同じルームへの再ログイン（退出通知なし）
    // 3. 別ルームへの再ログイン（旧ルームへ退出通知）
    // 4. 古い接続による登録解除は無視される
    // 5. 最後のメンバーが抜けるとルームのエントリが消える
    // ========================================

    fn room(name: &str) -> RoomName {
        RoomName::new(name.to_string()).unwrap()
    }

    fn session(name: &str, room_name: &str) -> LiveSession {
        LiveSession {
            connection_id: ConnectionId::generate(),
            identity: Identity::new(
                UserId::new(name.len() as i64),
                DisplayName::new(name.to_string()).unwrap(),
                Role::User,
            ),
            room: room(room_name),
        }
    }

    /// Check the iff-invariant between sessions and room sets
    fn assert_consistent(presence: &Presence) {
        for (name, session) in &presence.sessions {
            assert_eq!(
                presence.rooms.get(&session.room).and_then(|m| m.get(name)),
                Some(&session.connection_id)
            );
        }
        for (room_name, members) in &presence.rooms {
            assert!(!members.is_empty());
            for (name, id) in members {
                let session = presence.sessions.get(name).unwrap();
                assert_eq!(&session.room, room_name);
                assert_eq!(&session.connection_id, id);
            }
        }
    }

    #[test]
    fn test_register_first_session() {
        // テスト項目: 初回登録では退去が発生せず、ルームのピアに含まれる
        // given (前提条件):
        let mut presence = Presence::new();
        let alice = session("alice", "general");
        let bob = session("bob", "general");

        // when (操作):
        let evicted_a = presence.register(alice.clone());
        let evicted_b = presence.register(bob.clone());

        // then (期待する結果):
        assert!(evicted_a.is_none());
        assert!(evicted_b.is_none());
        assert_eq!(
            presence.peers(&room("general"), Some(bob.connection_id)),
            vec![alice.connection_id]
        );
        assert_eq!(presence.online_count(&room("general")), 2);
        assert_consistent(&presence);
    }

    #[test]
    fn test_register_same_identity_same_room_evicts_silently() {
        // テスト項目: 同じルームへの再ログインは旧接続を退去させ、退出通知は不要
        // given (前提条件):
        let mut presence = Presence::new();
        let bob = session("bob", "general");
        let first = session("alice", "general");
        presence.register(bob);
        presence.register(first.clone());

        // when (操作):
        let mut second = session("alice", "general");
        second.identity = first.identity.clone();
        let eviction = presence.register(second.clone()).unwrap();

        // then (期待する結果):
        assert_eq!(eviction.session, first);
        assert!(eviction.notify.is_empty());
        assert_eq!(presence.session_count(), 2);
        assert_eq!(
            presence.session(&first.identity.name).unwrap().connection_id,
            second.connection_id
        );
        assert_consistent(&presence);
    }

    #[test]
    fn test_register_same_identity_other_room_notifies_old_room() {
        // テスト項目: 別ルームへの再ログインでは旧ルームの残りメンバーに通知する
        // given (前提条件):
        let mut presence = Presence::new();
        let bob = session("bob", "general");
        let first = session("alice", "general");
        presence.register(bob.clone());
        presence.register(first.clone());

        // when (操作):
        let mut second = session("alice", "random");
        second.identity = first.identity.clone();
        let eviction = presence.register(second).unwrap();

        // then (期待する結果):
        assert_eq!(eviction.notify, vec![bob.connection_id]);
        assert_eq!(presence.members(&room("general")), vec![bob.identity.name]);
        assert_eq!(presence.members(&room("random")), vec![first.identity.name]);
        assert_consistent(&presence);
    }

    #[test]
    fn test_stale_unregister_does_not_remove_newer_session() {
        // テスト項目: 置き換え済みの古い接続の登録解除は新しいエントリを消さない
        // given (前提条件):
        let mut presence = Presence::new();
        let first = session("alice", "general");
        let mut second = session("alice", "general");
        second.identity = first.identity.clone();
        presence.register(first.clone());
        presence.register(second.clone());

        // when (操作):
        let departure = presence.unregister(&first.identity.name, first.connection_id);

        // then (期待する結果):
        assert!(departure.is_none());
        assert_eq!(
            presence.session(&first.identity.name).unwrap().connection_id,
            second.connection_id
        );
        assert_eq!(presence.online_count(&room("general")), 1);
        assert_consistent(&presence);
    }

    #[test]
    fn test_unregister_last_member_drops_room_entry() {
        // テスト項目: 最後のメンバーが抜けるとルームのエントリが削除される
        // given (前提条件):
        let mut presence = Presence::new();
        let alice = session("alice", "general");
        presence.register(alice.clone());

        // when (操作):
        let departure = presence
            .unregister(&alice.identity.name, alice.connection_id)
            .unwrap();

        // then (期待する結果):
        assert_eq!(departure.room, room("general"));
        assert!(departure.notify.is_empty());
        assert!(!presence.is_tracking(&room("general")));
        assert_eq!(presence.session_count(), 0);
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        // テスト項目: 同じ接続の登録解除を 2 回行っても 2 回目は何もしない
        // given (前提条件):
        let mut presence = Presence::new();
        let alice = session("alice", "general");
        let bob = session("bob", "general");
        presence.register(alice.clone());
        presence.register(bob.clone());

        // when (操作):
        let first = presence.unregister(&alice.identity.name, alice.connection_id);
        let second = presence.unregister(&alice.identity.name, alice.connection_id);

        // then (期待する結果):
        assert_eq!(first.unwrap().notify, vec![bob.connection_id]);
        assert!(second.is_none());
        assert_consistent(&presence);
    }

    #[test]
    fn test_join_leave_sequence_keeps_index_exact() {
        // テスト項目: 任意の参加・退出・置き換えの連続後もインデックスが正確
        // given (前提条件):
        let mut presence = Presence::new();
        let names = ["alice", "bob", "carol", "dave"];
        let rooms = ["general", "random"];
        let mut live: HashMap<&str, LiveSession> = HashMap::new();

        // when (操作):
        for step in 0..40usize {
            let name = names[step % names.len()];
            let room_name = rooms[(step / 3) % rooms.len()];
            if step % 5 == 4 {
                if let Some(s) = live.remove(name) {
                    presence.unregister(&s.identity.name, s.connection_id);
                }
            } else {
                let s = session(name, room_name);
                presence.register(s.clone());
                live.insert(name, s);
            }
            assert_consistent(&presence);
        }

        // then (期待する結果):
        for room_name in rooms {
            let mut expected: Vec<DisplayName> = live
                .values()
                .filter(|s| s.room.as_str() == room_name)
                .map(|s| s.identity.name.clone())
                .collect();
            expected.sort();
            assert_eq!(presence.members(&room(room_name)), expected);
        }
    }
}
