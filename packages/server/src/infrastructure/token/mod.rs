//! 資格情報（トークン）の発行と検証

pub mod hmac;

pub use hmac::{Claims, HmacTokenService, TokenError, TokenKind, TokenPair, inspect};
