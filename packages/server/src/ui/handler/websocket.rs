//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, Outbound, RoomName},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::state::AppState,
};

/// `GET /ws/{room}`
///
/// The room name is fixed for the lifetime of the connection and validated
/// before the upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let room = match RoomName::try_from(room.clone()) {
        Ok(room) => room,
        Err(e) => {
            tracing::warn!("Rejecting upgrade for room '{}': {}", room, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room)))
}

/// Spawns a task that drains the connection's outbound queue into the WebSocket sink.
///
/// `Outbound::Close` sends a close frame and ends the task, which in turn ends
/// the connection.
///
/// # Arguments
///
/// * `rx` - Outbound queue fed by the MessagePusher
/// * `sender` - WebSocket sink of this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let event = match outbound {
                Outbound::Event(event) => event,
                Outbound::Close => {
                    if let Err(e) = sender.send(Message::Close(None)).await {
                        tracing::debug!("Close frame not delivered: {}", e);
                    }
                    break;
                }
            };

            // Domain Event から DTO への変換
            let frame = ServerMessage::from(event);
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize outbound frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Feeds inbound frames to the gateway until the client goes away
async fn reader_loop(
    state: &AppState,
    connection: &mut Connection,
    receiver: &mut SplitStream<WebSocket>,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("Connection '{}': WebSocket error: {}", connection.id(), e);
                break;
            }
        };

        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                // DTO から Domain Event への変換
                Ok(frame) => state.gateway.dispatch(connection, frame.into()).await,
                Err(e) => state.gateway.reject_frame(connection, &e.to_string()).await,
            },
            Message::Close(_) => {
                tracing::debug!("Connection '{}' requested close", connection.id());
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: RoomName) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut connection = state.gateway.connect(room, tx).await;
    let mut send_task = pusher_loop(rx, sender);

    // The writer ends on a forced close; the reader ends when the client leaves
    tokio::select! {
        _ = &mut send_task => {}
        _ = reader_loop(&state, &mut connection, &mut receiver) => send_task.abort(),
    };

    state.gateway.disconnect(&mut connection).await;
}
