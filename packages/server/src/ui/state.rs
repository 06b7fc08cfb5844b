//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{IdentityVerifier, MessagePusher, Presence, RoomRepository},
    usecase::{CreateRoomUseCase, Gateway, JoinRoomUseCase, ListRoomsUseCase, QueryRoomUseCase},
};

/// Shared application state
pub struct AppState {
    /// Gateway（WebSocket イベントのディスパッチャ）
    pub gateway: Gateway,
    /// HTTP API のベアラートークン検証
    pub verifier: Arc<dyn IdentityVerifier>,
    /// ライブプレゼンス（ルームの接続数表示に使う）
    pub presence: Arc<Mutex<Presence>>,
    pub create_room_usecase: CreateRoomUseCase,
    pub join_room_usecase: JoinRoomUseCase,
    pub list_rooms_usecase: ListRoomsUseCase,
    pub query_room_usecase: QueryRoomUseCase,
}

impl AppState {
    /// Wire every use case onto the given collaborators
    ///
    /// The presence registry starts empty; live sessions never survive a
    /// restart.
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        verifier: Arc<dyn IdentityVerifier>,
        message_pusher: Arc<dyn MessagePusher>,
        history_limit: usize,
    ) -> Self {
        let presence = Arc::new(Mutex::new(Presence::new()));

        Self {
            gateway: Gateway::new(
                repository.clone(),
                verifier.clone(),
                message_pusher,
                presence.clone(),
                history_limit,
            ),
            verifier,
            create_room_usecase: CreateRoomUseCase::new(repository.clone()),
            join_room_usecase: JoinRoomUseCase::new(repository.clone()),
            list_rooms_usecase: ListRoomsUseCase::new(repository.clone(), presence.clone()),
            query_room_usecase: QueryRoomUseCase::new(repository, presence.clone(), history_limit),
            presence,
        }
    }
}
