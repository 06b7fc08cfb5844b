//! Client-side errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication rejected ({code}): {message}")]
    AuthRejected { code: String, message: String },

    #[error("session replaced: {0}")]
    SessionReplaced(String),

    #[error("connection error: {0}")]
    ConnectionError(String),
}
