//! File lifecycle operations: upload, metadata reads, description jobs and deletion.
//!
//! Every mutation writes the record store first and then invalidates the
//! metadata cache. A failed invalidation fails the request, since swallowing
//! it would let a stale snapshot outlive the write. Cache reads and
//! read-path repopulation are best-effort.

use coursefiles_core::models::{
    file_type_from_name, DescriptionState, DescriptionStatus, FileFilter, FileListPage,
    FileRecord, JobHandle, NewFileRecord, UploadedFile,
};
use coursefiles_core::{AppError, Config};
use coursefiles_db::FileRecordStore;
use coursefiles_processing::{extract_text, UploadValidator};
use coursefiles_storage::{blob_key, content_type_for, BlobStore};
use coursefiles_summarizer::Summarizer;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLookup, MetadataCache};

/// Tunables for the lifecycle service.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleSettings {
    /// How long a metadata snapshot stays cached
    pub metadata_ttl: Duration,
    /// Lifetime of presigned download links
    pub download_url_ttl: Duration,
}

impl LifecycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            metadata_ttl: Duration::from_secs(config.cache_ttl_secs()),
            download_url_ttl: Duration::from_secs(config.download_url_ttl_secs()),
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            metadata_ttl: Duration::from_secs(coursefiles_core::constants::FILE_METADATA_TTL_SECS),
            download_url_ttl: Duration::from_secs(
                coursefiles_core::constants::DOWNLOAD_URL_TTL_SECS,
            ),
        }
    }
}

/// Orchestrates the record store, blob store, summarizer and metadata cache.
pub struct FileLifecycleService {
    records: Arc<dyn FileRecordStore>,
    blobs: Arc<dyn BlobStore>,
    summarizer: Arc<dyn Summarizer>,
    cache: MetadataCache,
    validator: UploadValidator,
    settings: LifecycleSettings,
}

/// Run text extraction off the async executor; PDF parsing is CPU-bound.
async fn extract_text_blocking(
    data: Vec<u8>,
    file_name: String,
) -> Result<(Vec<u8>, String), AppError> {
    let (data, text) = tokio::task::spawn_blocking(move || {
        let text = extract_text(&data, &file_name);
        (data, text)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Text extraction task failed: {}", e)))?;

    Ok((data, text?))
}

fn validate_id(id: i32) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::InvalidInput(format!(
            "Invalid file id {}: must be a positive integer",
            id
        )));
    }
    Ok(())
}

impl FileLifecycleService {
    pub fn new(
        records: Arc<dyn FileRecordStore>,
        blobs: Arc<dyn BlobStore>,
        summarizer: Arc<dyn Summarizer>,
        cache: MetadataCache,
        validator: UploadValidator,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            records,
            blobs,
            summarizer,
            cache,
            validator,
            settings,
        }
    }

    /// Filtered listing straight from the record store.
    #[tracing::instrument(skip(self, filter))]
    pub async fn list(&self, filter: FileFilter) -> Result<FileListPage, AppError> {
        let filter = filter.normalized();
        Ok(self.records.list(&filter).await?)
    }

    /// Upload a new file and start its description job.
    ///
    /// Order: validate and extract, store the blob, submit the job, create
    /// the record, then invalidate and repopulate the cache. If the job
    /// cannot be submitted no record is created and the blob stays behind.
    #[tracing::instrument(
        skip(self, upload),
        fields(
            file_name = %upload.file_name,
            user_id = upload.user_id,
            course_id = upload.course_id,
            size_bytes = upload.data.len()
        )
    )]
    pub async fn create(&self, upload: UploadedFile) -> Result<FileRecord, AppError> {
        let UploadedFile {
            file_name,
            data,
            user_id,
            course_id,
        } = upload;
        let file_name = file_name.trim().to_string();

        self.validator
            .validate_all(user_id, course_id, &file_name, data.len())?;
        let (data, content) = extract_text_blocking(data, file_name.clone()).await?;

        let file_size = data.len() as i64;
        let storage_key = blob_key(user_id, course_id, &file_name);
        self.blobs
            .upload_with_key(
                &storage_key,
                data,
                content_type_for(&file_name),
                Some(&file_name),
            )
            .await?;

        let job = self.summarizer.submit(&content).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                storage_key = %storage_key,
                "Description job submission failed, uploaded blob left in place"
            );
            AppError::from(e)
        })?;

        let record = self
            .records
            .create(NewFileRecord {
                file_type: file_type_from_name(&file_name),
                file_name,
                file_size,
                storage_key,
                description_job: job,
                user_id,
                course_id,
            })
            .await?;

        self.cache.invalidate(record.id).await?;
        if let Err(e) = self
            .cache
            .set(record.id, &record, self.settings.metadata_ttl)
            .await
        {
            tracing::warn!(error = %e, file_id = record.id, "Failed to warm metadata cache after create");
        }

        tracing::info!(
            file_id = record.id,
            storage_key = %record.storage_key,
            job_id = %record.description_job,
            "Course file created"
        );

        Ok(record)
    }

    /// Cache-aside read of a file's metadata.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, id: i32) -> Result<FileRecord, AppError> {
        validate_id(id)?;

        if let CacheLookup::Hit(record) = self.cache.get(id).await {
            tracing::debug!(file_id = id, "Metadata cache hit");
            return Ok(record);
        }

        let record = self.records.get(id).await?;

        if let Err(e) = self.cache.set(id, &record, self.settings.metadata_ttl).await {
            tracing::warn!(error = %e, file_id = id, "Failed to populate metadata cache");
        }

        Ok(record)
    }

    /// Metadata for the detail view.
    pub async fn read_detail(&self, id: i32) -> Result<FileRecord, AppError> {
        self.read(id).await
    }

    /// Poll the file's description job once.
    ///
    /// A pending job is `Processing`, not an error; a failed job is
    /// [`AppError::JobFailed`].
    #[tracing::instrument(skip(self))]
    pub async fn read_description(&self, id: i32) -> Result<DescriptionStatus, AppError> {
        let record = self.read(id).await?;

        match self.summarizer.poll(record.job_handle()).await? {
            DescriptionState::Pending => Ok(DescriptionStatus::Processing),
            DescriptionState::Ready(text) => Ok(DescriptionStatus::Ready { text }),
            DescriptionState::Failed(reason) => {
                tracing::warn!(
                    file_id = id,
                    job_id = %record.description_job,
                    reason = %reason,
                    "Description job failed"
                );
                Err(AppError::JobFailed(reason))
            }
        }
    }

    /// Time-bounded download URL for the file's blob.
    #[tracing::instrument(skip(self))]
    pub async fn download_link(&self, id: i32) -> Result<String, AppError> {
        let record = self.read(id).await?;

        let url = self
            .blobs
            .get_presigned_url(
                &record.storage_key,
                &record.file_name,
                self.settings.download_url_ttl,
            )
            .await?;

        Ok(url)
    }

    /// Start a fresh description job over the stored blob and record its handle.
    ///
    /// The cache entry is invalidated, not repopulated.
    #[tracing::instrument(skip(self))]
    pub async fn update_description(&self, id: i32) -> Result<JobHandle, AppError> {
        let record = self.read(id).await?;

        let data = self.blobs.download(&record.storage_key).await?;
        let (_, content) = extract_text_blocking(data, record.file_name.clone()).await?;

        let job = self.summarizer.submit(&content).await?;
        self.records.update_description(id, &job).await?;
        self.cache.invalidate(id).await?;

        tracing::info!(
            file_id = id,
            previous_job_id = %record.description_job,
            job_id = %job,
            "Description job replaced"
        );

        Ok(job)
    }

    /// Remove the record, its cache entry and its blob, in that order.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let record = self.read(id).await?;

        self.records.delete(id).await?;
        self.cache.invalidate(id).await?;
        self.blobs.delete(&record.storage_key).await?;

        tracing::info!(
            file_id = id,
            storage_key = %record.storage_key,
            "Course file deleted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestContext;
    use coursefiles_core::{Backend, ErrorMetadata};

    fn upload(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            data: data.to_vec(),
            user_id: 1,
            course_id: 2,
        }
    }

    fn assert_backend(err: AppError, expected: Backend) {
        match err {
            AppError::BackendUnavailable { backend, .. } => assert_eq!(backend, expected),
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_then_processing_then_ready() {
        let ctx = TestContext::new().with_next_id(42);

        let record = ctx
            .service
            .create(upload("notes.txt", b"Ownership and borrowing"))
            .await
            .unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.storage_key, "1-2-notes.txt");
        assert_eq!(record.file_type, ".txt");

        let status = ctx.service.read_description(42).await.unwrap();
        assert_eq!(status, DescriptionStatus::Processing);
        assert_eq!(status.text(), None);

        ctx.summarizer
            .complete(record.job_handle(), "A short course summary.");
        let status = ctx.service.read_description(42).await.unwrap();
        assert_eq!(
            status,
            DescriptionStatus::Ready {
                text: "A short course summary.".to_string()
            }
        );
        assert_eq!(ctx.summarizer.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_create_submits_extracted_text() {
        let ctx = TestContext::new();
        ctx.service
            .create(upload("notes.md", b"  # Week 1\nTraits  "))
            .await
            .unwrap();

        assert_eq!(ctx.summarizer.submissions(), vec!["# Week 1\nTraits".to_string()]);
    }

    #[tokio::test]
    async fn test_create_warms_cache() {
        let ctx = TestContext::new();
        let record = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();

        let read = ctx.service.read(record.id).await.unwrap();
        assert_eq!(read, record);
        assert_eq!(ctx.records.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_job_submission_creates_no_record() {
        let ctx = TestContext::new();
        ctx.summarizer.fail_submissions(true);

        let err = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap_err();
        assert_backend(err, Backend::Summarizer);

        assert_eq!(ctx.records.len(), 0);
        // Blob is intentionally not rolled back
        assert!(ctx.blobs.contains("1-2-notes.txt"));

        let err = ctx.service.read(1).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_failed_blob_upload_aborts_before_job() {
        let ctx = TestContext::new();
        ctx.blobs.fail_uploads(true);

        let err = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap_err();
        assert_backend(err, Backend::BlobStore);
        assert!(ctx.summarizer.submissions().is_empty());
        assert_eq!(ctx.records.len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_uploads_touch_no_backend() {
        let ctx = TestContext::new();

        let err = ctx
            .service
            .create(UploadedFile {
                user_id: 0,
                ..upload("notes.txt", b"content")
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = ctx
            .service
            .create(upload("../notes.txt", b"content"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = ctx
            .service
            .create(upload("photo.png", b"\x89PNG"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_REJECTED");

        let too_big = vec![b'a'; 5 * 1024 * 1024];
        let err = ctx
            .service
            .create(upload("big.txt", &too_big))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_REJECTED");

        assert!(ctx.blobs.is_empty());
        assert!(ctx.summarizer.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_read_through_populates_cache() {
        let ctx = TestContext::new();
        let seeded = ctx.records.insert(crate::test_helpers::sample_record(7));

        let first = ctx.service.read(7).await.unwrap();
        let second = ctx.service.read(7).await.unwrap();

        assert_eq!(first, seeded);
        assert_eq!(first, second);
        assert_eq!(ctx.records.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_read_missing_and_invalid_ids() {
        let ctx = TestContext::new();

        let err = ctx.service.read(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = ctx.service.read(0).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(ctx.records.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_record_store_outage_is_not_not_found() {
        let ctx = TestContext::new();
        ctx.records.fail_requests(true);

        let err = ctx.service.read(7).await.unwrap_err();
        assert_backend(err, Backend::RecordStore);
    }

    #[tokio::test]
    async fn test_cache_read_outage_falls_through() {
        let ctx = TestContext::new();
        ctx.records.insert(crate::test_helpers::sample_record(7));
        ctx.cache_backend.fail_gets(true);
        ctx.cache_backend.fail_sets(true);

        assert!(ctx.service.read(7).await.is_ok());
        assert!(ctx.service.read(7).await.is_ok());
        assert_eq!(ctx.records.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_job_is_reported_as_job_failed() {
        let ctx = TestContext::new();
        let record = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();
        ctx.summarizer.fail(record.job_handle(), "content filtered");

        let err = ctx.service.read_description(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::JobFailed(ref reason) if reason == "content filtered"));
    }

    #[tokio::test]
    async fn test_delete_then_read_is_not_found() {
        let ctx = TestContext::new().with_next_id(42);
        ctx.service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();

        ctx.service.delete(42).await.unwrap();

        let err = ctx.service.read(42).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!ctx.blobs.contains("1-2-notes.txt"));
    }

    #[tokio::test]
    async fn test_delete_with_failed_invalidation_is_backend_unavailable() {
        let ctx = TestContext::new();
        let record = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();
        ctx.cache_backend.fail_deletes(true);

        let err = ctx.service.delete(record.id).await.unwrap_err();
        assert_eq!(err.error_code(), "BACKEND_UNAVAILABLE");
        assert_backend(err, Backend::Cache);
        // Record is gone but the blob deletion was never attempted
        assert_eq!(ctx.records.len(), 0);
        assert!(ctx.blobs.contains(&record.storage_key));
    }

    #[tokio::test]
    async fn test_update_description_replaces_handle_and_converges() {
        let ctx = TestContext::new();
        let record = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();
        ctx.summarizer.complete(record.job_handle(), "old summary");

        let new_job = ctx.service.update_description(record.id).await.unwrap();
        assert_ne!(&new_job, record.job_handle());

        // Next read sees the new handle, not the cached snapshot
        let reread = ctx.service.read(record.id).await.unwrap();
        assert_eq!(reread.description_job, new_job);
        assert_eq!(
            ctx.service.read_description(record.id).await.unwrap(),
            DescriptionStatus::Processing
        );

        ctx.summarizer.complete(&new_job, "new summary");
        assert_eq!(
            ctx.service
                .read_description(record.id)
                .await
                .unwrap()
                .text(),
            Some("new summary")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_read_description_during_update_sees_one_handle() {
        let ctx = TestContext::new();

        for round in 0..20 {
            let record = ctx
                .service
                .create(upload(&format!("notes-{}.txt", round), b"content"))
                .await
                .unwrap();
            ctx.summarizer.complete(record.job_handle(), "old summary");
            let id = record.id;
            // Warm the cache so the reader may hit the stale snapshot
            ctx.service.read(id).await.unwrap();

            let reader = {
                let service = ctx.service.clone();
                tokio::spawn(async move { service.read_description(id).await })
            };
            let writer = {
                let service = ctx.service.clone();
                tokio::spawn(async move { service.update_description(id).await })
            };
            let (status, new_job) = tokio::join!(reader, writer);
            let status = status.unwrap().unwrap();
            let new_job = new_job.unwrap().unwrap();

            let old_view = DescriptionStatus::Ready {
                text: "old summary".to_string(),
            };
            assert!(
                status == old_view || status == DescriptionStatus::Processing,
                "round {}: mixed view {:?}",
                round,
                status
            );
            assert_eq!(ctx.service.read(id).await.unwrap().description_job, new_job);
        }
    }

    #[tokio::test]
    async fn test_update_description_with_failed_invalidation() {
        let ctx = TestContext::new();
        let record = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();
        ctx.cache_backend.fail_deletes(true);

        let err = ctx.service.update_description(record.id).await.unwrap_err();
        assert_backend(err, Backend::Cache);
    }

    #[tokio::test]
    async fn test_download_link_uses_record_name() {
        let ctx = TestContext::new();
        let record = ctx
            .service
            .create(upload("notes.txt", b"content"))
            .await
            .unwrap();

        let url = ctx.service.download_link(record.id).await.unwrap();
        assert!(url.contains("1-2-notes.txt"));
        assert!(url.contains("download=notes.txt"));
        assert!(url.contains("expires=3600"));
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let ctx = TestContext::new();
        ctx.service
            .create(upload("a.txt", b"a"))
            .await
            .unwrap();
        ctx.service
            .create(UploadedFile {
                course_id: 3,
                ..upload("b.txt", b"b")
            })
            .await
            .unwrap();

        let page = ctx
            .service
            .list(FileFilter {
                course_id: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].file_name, "b.txt");

        let page = ctx.service.list(FileFilter::default()).await.unwrap();
        assert_eq!(page.total, 2);
    }
}
