use async_trait::async_trait;
use coursefiles_core::{AppError, Backend};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache entry could not be encoded: {0}")]
    Serialization(String),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::backend(Backend::Cache, err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store with per-entry expiry.
///
/// Implementations must tolerate concurrent calls; `set` is last-writer-wins
/// and `delete` of a missing key succeeds.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value`, replacing any existing entry and resetting its expiry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;
}
