//! UseCase 層のエラー型
//!
//! 失敗の分類（taxonomy）と、それぞれの安定したマシンコード。

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError, VerifyError, connection::Refusal};

/// ゲートウェイ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 資格情報がない・不正
    #[error("Unauthorized")]
    Unauthorized,

    /// 有効な Identity だがルームのメンバーでない、またはルームの秘密が違う
    #[error("Forbidden")]
    Forbidden,

    #[error("Room '{0}' not found")]
    NotFound(String),

    /// 既にメンバー・既に認証済みなど（致命的ではない）
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    /// ストア・検証器が利用できない
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// ワイヤ上で使うマシンコード
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::Forbidden => "forbidden",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Conflict(_) => "conflict",
            GatewayError::Invalid(_) => "invalid",
            GatewayError::Internal(_) => "internal",
        }
    }

    /// クライアントに見せる説明文（内部エラーの詳細は含めない）
    pub fn notice(&self) -> String {
        match self {
            GatewayError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<Refusal> for GatewayError {
    fn from(refusal: Refusal) -> Self {
        match refusal {
            Refusal::MissingCredential | Refusal::NotAuthenticated => GatewayError::Unauthorized,
            Refusal::AlreadyAuthenticated => {
                GatewayError::Conflict("Already authenticated".to_string())
            }
            Refusal::InvalidContent(e) => GatewayError::Invalid(e.to_string()),
        }
    }
}

impl From<RepositoryError> for GatewayError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(name) => GatewayError::NotFound(name),
            RepositoryError::RoomAlreadyExists(name) => {
                GatewayError::Conflict(format!("Room '{}' already exists", name))
            }
            RepositoryError::Unavailable(detail) => GatewayError::Internal(detail),
        }
    }
}

impl From<VerifyError> for GatewayError {
    fn from(_: VerifyError) -> Self {
        GatewayError::Unauthorized
    }
}

impl From<ValueObjectError> for GatewayError {
    fn from(error: ValueObjectError) -> Self {
        match error {
            ValueObjectError::SecretHash(_) => GatewayError::Internal(error.to_string()),
            _ => GatewayError::Invalid(error.to_string()),
        }
    }
}
