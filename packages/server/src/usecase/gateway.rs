//! ゲートウェイ（ディスパッチャ）
//!
//! トランスポートからの受信イベントを接続の状態機械に渡し、
//! 得られた遷移（エフェクト）を各ユースケースで実行します。
//! 状態機械の判定は純粋関数（`Connection::on_event`）で、
//! ストアやプレゼンスへの副作用はここから呼ばれるユースケースだけが持ちます。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    Connection, IdentityVerifier, InboundEvent, MessagePusher, Presence, PusherChannel,
    RoomName, RoomRepository, ServerEvent, Transition, connection::Refusal,
};

use super::{
    authenticate::AuthenticateUseCase, connect_participant::ConnectParticipantUseCase,
    disconnect_participant::DisconnectParticipantUseCase, error::GatewayError,
    send_message::SendMessageUseCase,
};

/// 受信イベントのルーター
pub struct Gateway {
    connect: ConnectParticipantUseCase,
    authenticate: AuthenticateUseCase,
    send_message: SendMessageUseCase,
    disconnect: DisconnectParticipantUseCase,
    message_pusher: Arc<dyn MessagePusher>,
}

impl Gateway {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        verifier: Arc<dyn IdentityVerifier>,
        message_pusher: Arc<dyn MessagePusher>,
        presence: Arc<Mutex<Presence>>,
        history_limit: usize,
    ) -> Self {
        Self {
            connect: ConnectParticipantUseCase::new(message_pusher.clone()),
            authenticate: AuthenticateUseCase::new(
                repository.clone(),
                verifier,
                message_pusher.clone(),
                presence.clone(),
                history_limit,
            ),
            send_message: SendMessageUseCase::new(
                repository,
                message_pusher.clone(),
                presence.clone(),
            ),
            disconnect: DisconnectParticipantUseCase::new(message_pusher.clone(), presence),
            message_pusher,
        }
    }

    /// トランスポート接続: 未認証の Connection を作る
    pub async fn connect(&self, room: RoomName, sender: PusherChannel) -> Connection {
        self.connect.execute(room, sender).await
    }

    /// 受信イベントを処理する
    pub async fn dispatch(&self, connection: &mut Connection, event: InboundEvent) {
        match connection.on_event(event) {
            Transition::Ignore => {}
            Transition::Heartbeat => {
                self.push(connection, ServerEvent::HeartbeatAck).await;
            }
            Transition::Authenticate { token } => {
                if let Err(e) = self.authenticate.execute(connection, &token).await {
                    tracing::warn!(
                        "Connection '{}': authentication into '{}' failed: {}",
                        connection.id(),
                        connection.room(),
                        e
                    );
                    self.terminate(connection, e).await;
                }
            }
            Transition::Send { author, content } => {
                let room = connection.room().clone();
                if let Err(e) = self
                    .send_message
                    .execute(connection.id(), &room, &author, content)
                    .await
                {
                    tracing::warn!(
                        "Connection '{}': message from '{}' in '{}' refused: {}",
                        connection.id(),
                        author.name,
                        room,
                        e
                    );
                    self.push(connection, send_error(&e)).await;
                }
            }
            Transition::Refuse(refusal) => {
                let during_auth = matches!(refusal, Refusal::AlreadyAuthenticated);
                let error = GatewayError::from(refusal);
                let event = if during_auth {
                    auth_error(&error)
                } else {
                    send_error(&error)
                };
                self.push(connection, event).await;
            }
            Transition::Terminate(refusal) => {
                tracing::warn!(
                    "Connection '{}': terminated ({:?})",
                    connection.id(),
                    refusal
                );
                self.terminate(connection, refusal.into()).await;
            }
        }
    }

    /// 解釈できないフレームへの応答（接続は維持する）
    pub async fn reject_frame(&self, connection: &Connection, detail: &str) {
        tracing::debug!(
            "Connection '{}': unreadable frame: {}",
            connection.id(),
            detail
        );
        let error = GatewayError::Invalid("Unrecognized message".to_string());
        self.push(connection, send_error(&error)).await;
    }

    /// トランスポート切断
    pub async fn disconnect(&self, connection: &mut Connection) {
        self.disconnect.execute(connection).await;
        tracing::info!("Connection '{}' closed", connection.id());
    }

    /// エラー通知を 1 つ送ってから強制切断する
    ///
    /// 認証済みの接続はプレゼンスからも外す（後のトランスポート切断は何もしない）。
    async fn terminate(&self, connection: &mut Connection, error: GatewayError) {
        self.push(connection, auth_error(&error)).await;
        self.message_pusher.close(&connection.id()).await;
        self.disconnect.execute(connection).await;
    }

    async fn push(&self, connection: &Connection, event: ServerEvent) {
        if let Err(e) = self.message_pusher.push_to(&connection.id(), event).await {
            tracing::warn!("Connection '{}': {}", connection.id(), e);
        }
    }
}

fn auth_error(error: &GatewayError) -> ServerEvent {
    ServerEvent::AuthError {
        code: error.code(),
        text: error.notice(),
    }
}

fn send_error(error: &GatewayError) -> ServerEvent {
    ServerEvent::SendError {
        code: error.code(),
        text: error.notice(),
    }
}
