//! Identity verifier trait.

use async_trait::async_trait;

use super::{entity::Identity, error::VerifyError};

/// Validates a bearer credential and yields the identity it names
///
/// Malformed, expired and mis-signed credentials all fail with the same
/// [`VerifyError::Invalid`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}
