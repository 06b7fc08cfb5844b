//! WebSocket client session management.

use std::time::Duration;

use agora_server::infrastructure::dto::websocket::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::error::ClientError;

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

const PING_INTERVAL_SECS: u64 = 30;

/// WebSocket address of `room` on the server at `base_url`.
pub fn room_url(base_url: &str, room: &str) -> String {
    format!(
        "{}/ws/{}",
        base_url.trim_end_matches('/'),
        room.replace(' ', "%20")
    )
}

/// Decide how a server frame ends the session, if at all.
pub fn session_outcome(message: &ServerMessage) -> Option<ClientError> {
    match message {
        ServerMessage::AuthError { code, message } => Some(ClientError::AuthRejected {
            code: code.clone(),
            message: message.clone(),
        }),
        ServerMessage::ConnectionReplaced { message } => {
            Some(ClientError::SessionReplaced(message.clone()))
        }
        _ => None,
    }
}

fn encode(message: &ClientMessage) -> Result<Message, ClientError> {
    serde_json::to_string(message)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| ClientError::ConnectionError(format!("failed to encode frame: {}", e)))
}

/// Run one WebSocket session: authenticate, then relay input until the
/// connection ends.
///
/// Returns `Ok(())` when the user ends input (Ctrl+C / Ctrl+D).
pub async fn run_client_session(
    base_url: &str,
    room: &str,
    token: &str,
) -> Result<(), ClientError> {
    let url = room_url(base_url, room);

    let (ws_stream, _response) = connect_async(&url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to {}", url);
    println!(
        "\nRoom '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        room
    );

    let (mut write, mut read) = ws_stream.split();

    let auth = encode(&ClientMessage::Auth {
        token: Some(token.to_string()),
    })?;
    write
        .send(auth)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let prompt = room.to_string();
    let prompt_for_read = prompt.clone();

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        let mut username = String::new();

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let Ok(frame) = serde_json::from_str::<ServerMessage>(&text) else {
                        print!("{}", MessageFormatter::format_raw_message(&text));
                        redisplay_prompt(&prompt_for_read);
                        continue;
                    };

                    if let ServerMessage::AuthSuccess { user, .. } = &frame {
                        username = user.username.clone();
                    }
                    if let Some(formatted) =
                        MessageFormatter::format_server_message(&frame, &username)
                    {
                        print!("{}", formatted);
                        redisplay_prompt(&prompt_for_read);
                    }
                    if let Some(error) = session_outcome(&frame) {
                        return Err(error);
                    }
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&prompt_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        Err::<(), _>(ClientError::ConnectionError("Connection lost".to_string()))
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_for_input = format!("{}> ", prompt);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt_for_input) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Input lines and keepalive pings share the write half
    let mut write_task = tokio::spawn(async move {
        let period = Duration::from_secs(PING_INTERVAL_SECS);
        let mut ping = interval_at(Instant::now() + period, period);

        loop {
            let frame = tokio::select! {
                line = input_rx.recv() => match line {
                    Some(message) => ClientMessage::SendMessage { message },
                    None => return Ok::<(), ClientError>(()),
                },
                _ = ping.tick() => ClientMessage::Ping,
            };

            let message = encode(&frame)?;
            if let Err(e) = write.send(message).await {
                tracing::warn!("Failed to send message: {}", e);
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or_else(|e| Err(ClientError::ConnectionError(e.to_string())))
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or_else(|e| Err(ClientError::ConnectionError(e.to_string())))
        }
    }
}
