use crate::keys::is_safe_key;
use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Blobs are flat files under `base_path`. Download links are plain URLs
/// under `base_url`; whatever serves that directory is responsible for
/// access control and expiry.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blobs (e.g., "/var/lib/coursefiles")
    /// * `base_url` - Base URL the directory is served under
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Keys are single path components; anything that could leave `base_path` is rejected.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if !is_safe_key(storage_key) || storage_key.contains('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
        _download_name: Option<&str>,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _download_name: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        Ok(self.generate_url(storage_key))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
