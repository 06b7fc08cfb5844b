//! Message formatting utilities for client display.

use agora_server::infrastructure::dto::websocket::{MessageDto, ServerMessage};
use chrono::DateTime;

const RULE: &str = "------------------------------------------------------------";
const BANNER: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render a server frame for the terminal.
    ///
    /// `username` is the local user, used to mark own messages. Returns `None`
    /// for frames with nothing to show (`pong`).
    pub fn format_server_message(message: &ServerMessage, username: &str) -> Option<String> {
        let formatted = match message {
            ServerMessage::AuthSuccess { user, room } => format!(
                "\n{}\nSigned in as {} ({}) in room '{}'\n{}\n",
                BANNER, user.username, user.role, room, BANNER
            ),
            ServerMessage::MessageHistory { messages } => {
                Self::format_history(messages, username)
            }
            ServerMessage::UserJoined { message, .. } => format!("\n+ {}\n", message),
            ServerMessage::UserLeft { message, .. } => format!("\n- {}\n", message),
            ServerMessage::MessageSent { message } => {
                format!("sent at {}\n", Self::format_timestamp(&message.timestamp))
            }
            ServerMessage::NewMessage { message } => Self::format_chat_message(message, username),
            ServerMessage::ConnectionReplaced { message } => format!("\n! {}\n", message),
            ServerMessage::AuthError { code, message } => {
                format!("\n! authentication failed ({}): {}\n", code, message)
            }
            ServerMessage::SendError { code, message } => {
                format!("\n! message not sent ({}): {}\n", code, message)
            }
            ServerMessage::Pong => return None,
        };
        Some(formatted)
    }

    fn format_history(messages: &[MessageDto], username: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nHistory:\n", BANNER));

        if messages.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for message in messages {
                let me_suffix = if message.username == username {
                    " (me)"
                } else {
                    ""
                };
                output.push_str(&format!(
                    "[{}] {}{}: {}\n",
                    Self::format_timestamp(&message.timestamp),
                    message.username,
                    me_suffix,
                    message.content
                ));
            }
        }

        output.push_str(BANNER);
        output.push('\n');
        output
    }

    /// Format a live chat message
    pub fn format_chat_message(message: &MessageDto, username: &str) -> String {
        let me_suffix = if message.username == username {
            " (me)"
        } else {
            ""
        };
        format!(
            "\n\n{}\n@{}{}: {}\nsent at {}\n{}\n",
            RULE,
            message.username,
            me_suffix,
            message.content,
            Self::format_timestamp(&message.timestamp),
            RULE
        )
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    /// `YYYY-MM-DD HH:MM:SS` in the offset the server sent; unparseable input is
    /// shown as-is.
    fn format_timestamp(timestamp: &str) -> String {
        DateTime::parse_from_rfc3339(timestamp)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| timestamp.to_string())
    }
}

#[cfg(test)]
mod tests {
    use agora_server::infrastructure::dto::websocket::UserDto;

    use super::*;

    fn message(id: i64, username: &str, content: &str) -> MessageDto {
        MessageDto {
            id,
            content: content.to_string(),
            timestamp: "2023-01-01T00:00:00+00:00".to_string(),
            user_id: id,
            username: username.to_string(),
        }
    }

    #[test]
    fn test_format_auth_success() {
        // テスト項目: 認証成功時にユーザー名とルーム名が表示される
        // given (前提条件):
        let frame = ServerMessage::AuthSuccess {
            user: UserDto {
                id: 1,
                username: "alice".to_string(),
                role: "member".to_string(),
            },
            room: "lobby".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_server_message(&frame, "alice").unwrap();

        // then (期待する結果):
        assert!(result.contains("Signed in as alice (member)"));
        assert!(result.contains("'lobby'"));
    }

    #[test]
    fn test_format_empty_history() {
        // テスト項目: 履歴が空の場合、適切なメッセージが表示される
        // given (前提条件):
        let frame = ServerMessage::MessageHistory { messages: vec![] };

        // when (操作):
        let result = MessageFormatter::format_server_message(&frame, "alice").unwrap();

        // then (期待する結果):
        assert!(result.contains("History:"));
        assert!(result.contains("(No messages yet)"));
    }

    #[test]
    fn test_format_history_marks_own_messages() {
        // テスト項目: 履歴は古い順に表示され、自分のメッセージにはマークが付く
        // given (前提条件):
        let frame = ServerMessage::MessageHistory {
            messages: vec![message(1, "alice", "hello"), message(2, "bob", "hi")],
        };

        // when (操作):
        let result = MessageFormatter::format_server_message(&frame, "alice").unwrap();

        // then (期待する結果):
        let alice = result.find("alice (me): hello").unwrap();
        let bob = result.find("bob: hi").unwrap();
        assert!(alice < bob);
        assert!(result.contains("[2023-01-01 00:00:00]"));
    }

    #[test]
    fn test_format_new_message() {
        // テスト項目: 他の参加者のメッセージが送信者と時刻付きで表示される
        // given (前提条件):
        let frame = ServerMessage::NewMessage {
            message: message(3, "bob", "how are you?"),
        };

        // when (操作):
        let result = MessageFormatter::format_server_message(&frame, "alice").unwrap();

        // then (期待する結果):
        assert!(result.contains("@bob: how are you?"));
        assert!(result.contains("sent at 2023-01-01 00:00:00"));
        assert!(!result.contains("(me)"));
    }

    #[test]
    fn test_format_presence_notices() {
        // テスト項目: 入室・退室の通知がサーバーの文言のまま表示される
        // given (前提条件):
        let joined = ServerMessage::UserJoined {
            username: "bob".to_string(),
            message: "bob joined the room".to_string(),
        };
        let left = ServerMessage::UserLeft {
            username: "bob".to_string(),
            message: "bob left the room".to_string(),
        };

        // when (操作):
        let joined = MessageFormatter::format_server_message(&joined, "alice").unwrap();
        let left = MessageFormatter::format_server_message(&left, "alice").unwrap();

        // then (期待する結果):
        assert_eq!(joined, "\n+ bob joined the room\n");
        assert_eq!(left, "\n- bob left the room\n");
    }

    #[test]
    fn test_format_errors() {
        // テスト項目: エラー通知にコードとメッセージが含まれる
        // given (前提条件):
        let auth = ServerMessage::AuthError {
            code: "unauthorized".to_string(),
            message: "Invalid token".to_string(),
        };
        let send = ServerMessage::SendError {
            code: "invalid".to_string(),
            message: "Message must not be blank".to_string(),
        };

        // when (操作):
        let auth = MessageFormatter::format_server_message(&auth, "alice").unwrap();
        let send = MessageFormatter::format_server_message(&send, "alice").unwrap();

        // then (期待する結果):
        assert!(auth.contains("(unauthorized): Invalid token"));
        assert!(send.contains("(invalid): Message must not be blank"));
    }

    #[test]
    fn test_format_pong_is_silent() {
        // テスト項目: pong は表示しない
        // given (前提条件):
        let frame = ServerMessage::Pong;

        // when (操作):
        let result = MessageFormatter::format_server_message(&frame, "alice");

        // then (期待する結果):
        assert!(result.is_none());
    }

    #[test]
    fn test_format_timestamp_falls_back_to_raw() {
        // テスト項目: 解釈できないタイムスタンプはそのまま表示される
        // given (前提条件):
        let timestamp = "yesterday";

        // when (操作):
        let result = MessageFormatter::format_timestamp(timestamp);

        // then (期待する結果):
        assert_eq!(result, "yesterday");
    }

    #[test]
    fn test_format_binary_message() {
        // テスト項目: バイナリメッセージの通知が正しくフォーマットされる
        // given (前提条件):
        let byte_count = 1024;

        // when (操作):
        let result = MessageFormatter::format_binary_message(byte_count);

        // then (期待する結果):
        assert!(result.contains("1024 bytes"));
    }
}
