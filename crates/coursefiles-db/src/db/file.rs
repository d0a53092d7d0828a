//! Course file repository: CRUD for the course_files table.

use chrono::{DateTime, Utc};
use coursefiles_core::models::{FileFilter, FileListPage, FileRecord, JobHandle, NewFileRecord};
use coursefiles_core::{AppError, Backend};
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

const SELECT_COLUMNS: &str = "id, file_name, file_type, file_size, storage_key, description_job, \
     user_id, course_id, created_at, updated_at";

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("File {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for RecordStoreError {
    fn from(err: sqlx::Error) -> Self {
        RecordStoreError::Backend(err.to_string())
    }
}

impl From<RecordStoreError> for AppError {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::NotFound(id) => AppError::NotFound(format!("File {} not found", id)),
            RecordStoreError::Backend(msg) => AppError::backend(Backend::RecordStore, msg),
        }
    }
}

pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

/// Authoritative store for file metadata records.
#[async_trait::async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Persist a new record; the store assigns id and timestamps.
    async fn create(&self, record: NewFileRecord) -> RecordStoreResult<FileRecord>;

    /// Fetch a record, or [`RecordStoreError::NotFound`].
    async fn get(&self, id: i32) -> RecordStoreResult<FileRecord>;

    /// Replace the description job reference.
    async fn update_description(&self, id: i32, job: &JobHandle) -> RecordStoreResult<()>;

    async fn delete(&self, id: i32) -> RecordStoreResult<()>;

    /// Filtered page of records, newest first, plus the unpaged total.
    async fn list(&self, filter: &FileFilter) -> RecordStoreResult<FileListPage>;
}

/// Row type for course_files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRecordRow {
    pub id: i32,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_key: String,
    pub description_job: String,
    pub user_id: i32,
    pub course_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecordRow {
    pub fn into_record(self) -> FileRecord {
        FileRecord {
            id: self.id,
            file_name: self.file_name,
            file_type: self.file_type,
            file_size: self.file_size,
            storage_key: self.storage_key,
            description_job: JobHandle::new(self.description_job),
            user_id: self.user_id,
            course_id: self.course_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Escape LIKE wildcards so a user-supplied name matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Append the WHERE clause for `filter`. Expects a normalized filter.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &FileFilter) {
    let mut separator = " WHERE ";

    if let Some(name) = &filter.file_name {
        builder
            .push(separator)
            .push("file_name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
        separator = " AND ";
    }
    if let Some(file_type) = &filter.file_type {
        builder
            .push(separator)
            .push("file_type = ")
            .push_bind(file_type.clone());
        separator = " AND ";
    }
    if let Some(user_id) = filter.user_id {
        builder.push(separator).push("user_id = ").push_bind(user_id);
        separator = " AND ";
    }
    if let Some(course_id) = filter.course_id {
        builder.push(separator).push("course_id = ").push_bind(course_id);
    }
}

fn count_query(filter: &FileFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM course_files");
    push_filters(&mut builder, filter);
    builder
}

fn page_query(filter: &FileFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM course_files", SELECT_COLUMNS));
    push_filters(&mut builder, filter);
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit())
        .push(" OFFSET ")
        .push_bind(filter.offset());
    builder
}

#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FileRecordStore for PgFileRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "course_files", db.operation = "insert", storage_key = %record.storage_key))]
    async fn create(&self, record: NewFileRecord) -> RecordStoreResult<FileRecord> {
        let query = format!(
            r#"
            INSERT INTO course_files
                (file_name, file_type, file_size, storage_key, description_job, user_id, course_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        );

        let row: FileRecordRow = sqlx::query_as::<Postgres, FileRecordRow>(&query)
            .bind(&record.file_name)
            .bind(&record.file_type)
            .bind(record.file_size)
            .bind(&record.storage_key)
            .bind(record.description_job.as_str())
            .bind(record.user_id)
            .bind(record.course_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into_record())
    }

    #[tracing::instrument(skip(self), fields(db.table = "course_files", db.operation = "select", db.record_id = id))]
    async fn get(&self, id: i32) -> RecordStoreResult<FileRecord> {
        let query = format!("SELECT {} FROM course_files WHERE id = $1", SELECT_COLUMNS);

        let row: Option<FileRecordRow> = sqlx::query_as::<Postgres, FileRecordRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(FileRecordRow::into_record)
            .ok_or(RecordStoreError::NotFound(id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "course_files", db.operation = "update", db.record_id = id))]
    async fn update_description(&self, id: i32, job: &JobHandle) -> RecordStoreResult<()> {
        let result = sqlx::query(
            "UPDATE course_files SET description_job = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(job.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RecordStoreError::NotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "course_files", db.operation = "delete", db.record_id = id))]
    async fn delete(&self, id: i32) -> RecordStoreResult<()> {
        let result = sqlx::query("DELETE FROM course_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RecordStoreError::NotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, filter), fields(db.table = "course_files", db.operation = "select"))]
    async fn list(&self, filter: &FileFilter) -> RecordStoreResult<FileListPage> {
        let filter = filter.clone().normalized();

        let total: i64 = count_query(&filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<FileRecordRow> = page_query(&filter)
            .build_query_as::<FileRecordRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(FileListPage {
            total,
            data: rows.into_iter().map(FileRecordRow::into_record).collect(),
        })
    }
}
