//! In-memory collaborators for testing
//!
//! These fakes let the lifecycle service run without Postgres, object storage
//! or the summarization API. Each one can be told to fail so outage paths are
//! testable.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use coursefiles_core::models::{
    DescriptionState, FileFilter, FileListPage, FileRecord, JobHandle, NewFileRecord,
};
use coursefiles_db::{FileRecordStore, RecordStoreError, RecordStoreResult};
use coursefiles_processing::UploadValidator;
use coursefiles_storage::{BlobStore, StorageBackend, StorageError, StorageResult};
use coursefiles_summarizer::{Summarizer, SummarizerError, SummarizerResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheBackend, CacheError, CacheResult, MemoryCacheBackend, MetadataCache};
use crate::lifecycle::{FileLifecycleService, LifecycleSettings};

/// Extensions accepted by [`TestContext`]'s validator.
pub const TEST_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "pdf", "docx"];

/// Upload limit used by [`TestContext`], 5 MB.
pub const TEST_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// A plausible stored record with a fixed timestamp.
pub fn sample_record(id: i32) -> FileRecord {
    let created_at = Utc
        .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    FileRecord {
        id,
        file_name: format!("lecture-{}.pdf", id),
        file_type: ".pdf".to_string(),
        file_size: 2048,
        storage_key: format!("1-2-lecture-{}.pdf", id),
        description_job: JobHandle::new(format!("seed-job-{}", id)),
        user_id: 1,
        course_id: 2,
        created_at,
        updated_at: created_at,
    }
}

/// Record store backed by a map, with auto-increment ids.
pub struct InMemoryRecordStore {
    records: Mutex<BTreeMap<i32, FileRecord>>,
    next_id: AtomicI32,
    get_calls: AtomicUsize,
    fail: AtomicBool,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
            get_calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Id assigned to the next created record.
    pub fn set_next_id(&self, id: i32) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    /// Seed a record directly, bypassing `create`.
    pub fn insert(&self, record: FileRecord) -> FileRecord {
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        record
    }

    /// Number of `get` calls that reached the store.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> RecordStoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Backend(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

fn matches_filter(record: &FileRecord, filter: &FileFilter) -> bool {
    let name_ok = filter.file_name.as_deref().map_or(true, |needle| {
        record
            .file_name
            .to_lowercase()
            .contains(&needle.to_lowercase())
    });
    let type_ok = filter
        .file_type
        .as_deref()
        .map_or(true, |t| record.file_type == t);
    let user_ok = filter.user_id.map_or(true, |u| record.user_id == u);
    let course_ok = filter.course_id.map_or(true, |c| record.course_id == c);

    name_ok && type_ok && user_ok && course_ok
}

#[async_trait]
impl FileRecordStore for InMemoryRecordStore {
    async fn create(&self, record: NewFileRecord) -> RecordStoreResult<FileRecord> {
        self.check_available()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let stored = FileRecord {
            id,
            file_name: record.file_name,
            file_type: record.file_type,
            file_size: record.file_size,
            storage_key: record.storage_key,
            description_job: record.description_job,
            user_id: record.user_id,
            course_id: record.course_id,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i32) -> RecordStoreResult<FileRecord> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RecordStoreError::NotFound(id))
    }

    async fn update_description(&self, id: i32, job: &JobHandle) -> RecordStoreResult<()> {
        self.check_available()?;

        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&id).ok_or(RecordStoreError::NotFound(id))?;
        record.description_job = job.clone();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i32) -> RecordStoreResult<()> {
        self.check_available()?;

        self.records
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RecordStoreError::NotFound(id))
    }

    async fn list(&self, filter: &FileFilter) -> RecordStoreResult<FileListPage> {
        self.check_available()?;

        let mut matching: Vec<FileRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| matches_filter(r, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect();

        Ok(FileListPage { total, data })
    }
}

/// Blob store backed by a map.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().unwrap().is_empty()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
        _download_name: Option<&str>,
    ) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("bucket unreachable".to_string()));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.blobs.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        download_name: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "https://blobs.test/{}?download={}&expires={}",
            storage_key,
            download_name,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.contains(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Summarizer whose job outcomes are set by the test.
///
/// Handles are issued as `job-1`, `job-2`, ... and start out pending.
#[derive(Default)]
pub struct ScriptedSummarizer {
    issued: AtomicUsize,
    states: Mutex<HashMap<JobHandle, DescriptionState>>,
    submissions: Mutex<Vec<String>>,
    fail_submit: AtomicBool,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, job: &JobHandle, state: DescriptionState) {
        self.states.lock().unwrap().insert(job.clone(), state);
    }

    pub fn complete(&self, job: &JobHandle, text: &str) {
        self.set_state(job, DescriptionState::Ready(text.to_string()));
    }

    pub fn fail(&self, job: &JobHandle, reason: &str) {
        self.set_state(job, DescriptionState::Failed(reason.to_string()));
    }

    /// Content of every accepted submission, oldest first.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn submit(&self, content: &str) -> SummarizerResult<JobHandle> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(SummarizerError::Api {
                status: 503,
                message: "service overloaded".to_string(),
            });
        }

        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let job = JobHandle::new(format!("job-{}", n));
        self.states
            .lock()
            .unwrap()
            .insert(job.clone(), DescriptionState::Pending);
        self.submissions.lock().unwrap().push(content.to_string());
        Ok(job)
    }

    async fn poll(&self, job: &JobHandle) -> SummarizerResult<DescriptionState> {
        self.states
            .lock()
            .unwrap()
            .get(job)
            .cloned()
            .ok_or_else(|| SummarizerError::JobNotFound(job.to_string()))
    }
}

/// Working in-memory cache whose operations can be switched to fail.
pub struct FailingCacheBackend {
    inner: MemoryCacheBackend,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for FailingCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FailingCacheBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryCacheBackend::new(1024),
            fail_gets: AtomicBool::new(false),
            fail_sets: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn outage(flag: &AtomicBool) -> CacheResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Self::outage(&self.fail_gets)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        Self::outage(&self.fail_sets)?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        Self::outage(&self.fail_deletes)?;
        self.inner.delete(key).await
    }
}

/// A lifecycle service wired to in-memory fakes, with handles to each fake.
pub struct TestContext {
    pub service: Arc<FileLifecycleService>,
    pub records: Arc<InMemoryRecordStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub summarizer: Arc<ScriptedSummarizer>,
    pub cache_backend: Arc<FailingCacheBackend>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let records = Arc::new(InMemoryRecordStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let summarizer = Arc::new(ScriptedSummarizer::new());
        let cache_backend = Arc::new(FailingCacheBackend::new());

        let validator = UploadValidator::new(
            TEST_MAX_FILE_SIZE,
            TEST_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        );

        let service = FileLifecycleService::new(
            records.clone(),
            blobs.clone(),
            summarizer.clone(),
            MetadataCache::new(cache_backend.clone()),
            validator,
            LifecycleSettings::default(),
        );

        Self {
            service: Arc::new(service),
            records,
            blobs,
            summarizer,
            cache_backend,
        }
    }

    /// Start record ids at `id`.
    pub fn with_next_id(self, id: i32) -> Self {
        self.records.set_next_id(id);
        self
    }
}
