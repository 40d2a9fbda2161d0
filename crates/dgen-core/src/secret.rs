//! Secret management service trait.

use crate::config::SecretConfig;
use crate::error::Result;

/// Loads API credentials.
///
/// Implementations must never include secret values in errors or logs.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    async fn load_secrets(&self) -> Result<SecretConfig>;

    async fn secret_file_exists(&self) -> bool;
}
