use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::{IntoParams, ToSchema};

use super::description::JobHandle;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Authoritative metadata for one uploaded course file.
///
/// `storage_key` never changes after creation; `description_job` is only
/// replaced by an explicit description update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    pub id: i32,
    pub file_name: String,
    /// Extension including the leading dot, e.g. `.pdf`
    pub file_type: String,
    pub file_size: i64,
    pub storage_key: String,
    #[schema(value_type = String)]
    pub description_job: JobHandle,
    pub user_id: i32,
    pub course_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn job_handle(&self) -> &JobHandle {
        &self.description_job
    }
}

/// Fields supplied when creating a record; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_key: String,
    pub description_job: JobHandle,
    pub user_id: i32,
    pub course_id: i32,
}

/// Raw upload as received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
    pub user_id: i32,
    pub course_id: i32,
}

/// Filter and paging for listing files.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileFilter {
    /// Substring match on the file name
    pub file_name: Option<String>,
    /// Exact match on the extension, e.g. `.pdf`
    pub file_type: Option<String>,
    /// 0 means any user
    pub user_id: Option<i32>,
    /// 0 means any course
    pub course_id: Option<i32>,
    /// Zero-based page number
    #[serde(rename = "pageNum", alias = "page_num")]
    pub page_num: Option<i64>,
    #[serde(rename = "pageSize", alias = "page_size")]
    pub page_size: Option<i64>,
}

impl FileFilter {
    /// Drop empty strings and zero ids, clamp paging.
    pub fn normalized(self) -> Self {
        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let non_zero = |id: Option<i32>| id.filter(|v| *v != 0);

        Self {
            file_name: non_empty(self.file_name),
            file_type: non_empty(self.file_type),
            user_id: non_zero(self.user_id),
            course_id: non_zero(self.course_id),
            page_num: Some(self.page_num.unwrap_or(0).max(0)),
            page_size: Some(
                self.page_size
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
            ),
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for the page; saturates so an absurd page lands past the end.
    pub fn offset(&self) -> i64 {
        self.page_num.unwrap_or(0).max(0).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileListPage {
    pub total: i64,
    pub data: Vec<FileRecord>,
}

/// Extension of `file_name` including the leading dot, or "" when absent.
pub fn file_type_from_name(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
