//! Blob storage abstraction
//!
//! Every storage backend implements [`BlobStore`]. The lifecycle service only
//! ever talks to this trait, so tests can swap in an in-memory store.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable storage for raw file bytes, addressed by an opaque key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `storage_key`, overwriting any existing blob.
    ///
    /// When `download_name` is given the blob is tagged so that a later
    /// download is served as an attachment with that file name.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
        download_name: Option<&str>,
    ) -> StorageResult<()>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key. Deleting a missing key succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Time-bounded GET URL for the blob.
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        download_name: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

impl From<StorageError> for coursefiles_core::AppError {
    fn from(err: StorageError) -> Self {
        use coursefiles_core::{AppError, Backend};

        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Blob {} not found", key)),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::backend(Backend::BlobStore, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursefiles_core::{AppError, ErrorMetadata};

    #[test]
    fn test_storage_errors_classify_as_blob_store_failures() {
        let err: AppError = StorageError::UploadFailed("connection reset".to_string()).into();
        assert_eq!(err.error_code(), "BACKEND_UNAVAILABLE");
        assert!(err.to_string().starts_with("blob store"));

        let err: AppError = StorageError::NotFound("1-2-a.txt".to_string()).into();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
