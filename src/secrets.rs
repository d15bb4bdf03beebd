// ABOUTME: Secret store seam for legacy source access token cleanup.
// ABOUTME: Only pipeline deletion touches secrets; everything else ignores them.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn delete_secret(&self, name: &str) -> Result<(), SecretError>;
}
