//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Username cannot be empty")]
    DisplayNameEmpty,

    #[error("Username must be between {min} and {max} characters long")]
    DisplayNameLength { min: usize, max: usize },

    #[error("Username can only contain letters, numbers, underscores, and hyphens")]
    DisplayNameCharacters,

    #[error("Room name cannot be empty")]
    RoomNameEmpty,

    #[error("Room name must be between {min} and {max} characters long")]
    RoomNameLength { min: usize, max: usize },

    #[error("Room name can only contain letters, numbers, spaces, underscores, and hyphens")]
    RoomNameCharacters,

    #[error("Message cannot be empty")]
    MessageEmpty,

    #[error("Message must not exceed {max} characters")]
    MessageTooLong { max: usize },

    #[error("Room password cannot be empty")]
    SecretEmpty,

    #[error("Room password could not be hashed: {0}")]
    SecretHash(String),

    #[error("Unknown role '{0}'")]
    UnknownRole(String),
}

/// Repository（ストア）操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// 資格情報の検証エラー
///
/// 形式不正・期限切れ・署名不一致を区別しない（オラクル対策）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Invalid credential")]
    Invalid,
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}
