//! HMAC-SHA256 で署名したベアラートークン
//!
//! ## 形式
//!
//! `base64url(JSON claims) "." hex(HMAC-SHA256(secret, claims_b64))`
//!
//! ## 有効期限
//!
//! - access: 30 分
//! - refresh: 7 日

use std::sync::Arc;

use agora_shared::time::{Clock, SystemClock};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::domain::{DisplayName, Identity, IdentityVerifier, Role, UserId, VerifyError};

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_TTL_SECS: i64 = 30 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// トークンに含まれるクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub name: String,
    pub role: Role,
    pub kind: TokenKind,
    /// Expiry (unix seconds)
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// トークン処理のエラー
///
/// 外部に返すときは `VerifyError::Invalid` に畳み込む。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token secret cannot be empty")]
    EmptySecret,

    #[error("Malformed token")]
    Malformed,

    #[error("Signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Expected a {expected:?} token")]
    WrongKind { expected: TokenKind },

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),
}

/// HMAC トークンの発行・検証サービス
pub struct HmacTokenService {
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl HmacTokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self { secret, clock })
    }

    /// access / refresh トークンの組を発行
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let now = self.now_secs();
        let claims = |kind, ttl| Claims {
            sub: identity.id.value(),
            name: identity.name.to_string(),
            role: identity.role,
            kind,
            exp: now + ttl,
        };

        Ok(TokenPair {
            access: self.encode(&claims(TokenKind::Access, ACCESS_TOKEN_TTL_SECS))?,
            refresh: self.encode(&claims(TokenKind::Refresh, REFRESH_TOKEN_TTL_SECS))?,
        })
    }

    /// refresh トークンと引き換えに新しい組を発行
    pub fn rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = self.decode(refresh_token, TokenKind::Refresh)?;
        let identity = identity_from(&claims)?;
        self.issue_pair(&identity)
    }

    /// 署名と期限を検証してクレームを取り出す
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims = inspect(token)?;
        if claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        if claims.exp <= self.now_secs() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let json =
            serde_json::to_vec(claims).map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::EmptySecret)
    }

    fn now_secs(&self) -> i64 {
        self.clock.now_millis().div_euclid(1000)
    }
}

/// 署名を検証せずにクレームを読む（診断用）
pub fn inspect(token: &str) -> Result<Claims, TokenError> {
    let (payload, _) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&json).map_err(|e| TokenError::InvalidClaims(e.to_string()))
}

fn identity_from(claims: &Claims) -> Result<Identity, TokenError> {
    let name = DisplayName::new(claims.name.clone())
        .map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
    Ok(Identity::new(UserId::new(claims.sub), name, claims.role))
}

#[async_trait]
impl IdentityVerifier for HmacTokenService {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let identity = self
            .decode(token, TokenKind::Access)
            .and_then(|claims| identity_from(&claims));

        identity.map_err(|e| {
            tracing::debug!("Credential rejected: {}", e);
            VerifyError::Invalid
        })
    }
}
