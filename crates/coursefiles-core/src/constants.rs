//! Application-wide constants.

/// Route prefix for the file API.
pub const API_PREFIX: &str = "/v1";

/// Cached file metadata expires after 20 minutes.
pub const FILE_METADATA_TTL_SECS: u64 = 20 * 60;

/// Lifetime of presigned download URLs.
pub const DOWNLOAD_URL_TTL_SECS: u64 = 60 * 60;

/// Uploads must be strictly smaller than this many megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 5;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Prompt appended to extracted file content when requesting a description.
pub const DEFAULT_SUMMARY_PROMPT: &str =
    "Please briefly analyze the content above. Keep the answer to about 500 words.";

pub const DEFAULT_SUMMARIZER_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_SUMMARIZER_MODEL: &str = "glm-4-flash";
