use crate::keys::content_disposition;
use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::time::Duration;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment; bucket and region are explicit.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    fn put_options(content_type: &str, download_name: Option<&str>) -> PutOptions {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        if let Some(name) = download_name {
            attributes.insert(
                Attribute::ContentDisposition,
                AttributeValue::from(content_disposition(name)),
            );
        }

        PutOptions {
            attributes,
            ..Default::default()
        }
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
        download_name: Option<&str>,
    ) -> StorageResult<()> {
        let size = data.len() as u64;
        let location = Path::from(storage_key.to_string());
        let opts = Self::put_options(content_type, download_name);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), opts)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _download_name: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        // Content-Disposition was attached at upload, so a plain signed GET is enough.
        let location = Path::from(storage_key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
