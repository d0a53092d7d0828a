//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a
//! `.env` file) and validated once at startup.

use std::env;

use crate::constants::{
    DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_SUMMARIZER_BASE_URL, DEFAULT_SUMMARIZER_MODEL,
    DEFAULT_SUMMARY_PROMPT, DOWNLOAD_URL_TTL_SECS, FILE_METADATA_TTL_SECS,
};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CACHE_MAX_ENTRIES: usize = 10_000;
const SUMMARIZER_MAX_INPUT_CHARS: usize = 60_000;
const SUMMARIZER_TIMEOUT_SECS: u64 = 30;

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub request_timeout_secs: u64,
}

/// File service configuration
#[derive(Clone, Debug)]
pub struct FileServiceConfig {
    pub base: BaseConfig,
    // Record store
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Blob storage
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, OSS, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub download_url_ttl_secs: u64,
    // Uploads
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    // Metadata cache
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    // Summarization service
    pub summarizer_api_key: String,
    pub summarizer_base_url: String,
    pub summarizer_model: String,
    pub summarizer_prompt: String,
    pub summarizer_max_input_chars: usize,
    pub summarizer_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<FileServiceConfig>);

impl Config {
    fn as_service(&self) -> &FileServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_service().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = FileServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.as_service().base.request_timeout_secs
    }

    pub fn database_url(&self) -> &str {
        &self.as_service().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_service().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_service().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_service().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_service().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_service().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_service().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_service().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_service().local_storage_base_url.as_deref()
    }

    pub fn download_url_ttl_secs(&self) -> u64 {
        self.as_service().download_url_ttl_secs
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_service().max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.as_service().allowed_extensions
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.as_service().cache_ttl_secs
    }

    pub fn cache_max_entries(&self) -> usize {
        self.as_service().cache_max_entries
    }

    pub fn summarizer_api_key(&self) -> &str {
        &self.as_service().summarizer_api_key
    }

    pub fn summarizer_base_url(&self) -> &str {
        &self.as_service().summarizer_base_url
    }

    pub fn summarizer_model(&self) -> &str {
        &self.as_service().summarizer_model
    }

    pub fn summarizer_prompt(&self) -> &str {
        &self.as_service().summarizer_prompt
    }

    pub fn summarizer_max_input_chars(&self) -> usize {
        self.as_service().summarizer_max_input_chars
    }

    pub fn summarizer_timeout_secs(&self) -> u64 {
        self.as_service().summarizer_timeout_secs
    }
}

impl FileServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok());

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        let config = FileServiceConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            download_url_ttl_secs: env::var("DOWNLOAD_URL_TTL_SECS")
                .unwrap_or_else(|_| DOWNLOAD_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_URL_TTL_SECS),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| "txt,md,csv,json,pdf,docx".to_string())
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| FILE_METADATA_TTL_SECS.to_string())
                .parse()
                .unwrap_or(FILE_METADATA_TTL_SECS),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| CACHE_MAX_ENTRIES.to_string())
                .parse()
                .unwrap_or(CACHE_MAX_ENTRIES),
            summarizer_api_key: env::var("SUMMARIZER_API_KEY")
                .map_err(|_| anyhow::anyhow!("SUMMARIZER_API_KEY must be set"))?,
            summarizer_base_url: env::var("SUMMARIZER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SUMMARIZER_BASE_URL.to_string()),
            summarizer_model: env::var("SUMMARIZER_MODEL")
                .unwrap_or_else(|_| DEFAULT_SUMMARIZER_MODEL.to_string()),
            summarizer_prompt: env::var("SUMMARIZER_PROMPT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string()),
            summarizer_max_input_chars: env::var("SUMMARIZER_MAX_INPUT_CHARS")
                .unwrap_or_else(|_| SUMMARIZER_MAX_INPUT_CHARS.to_string())
                .parse()
                .unwrap_or(SUMMARIZER_MAX_INPUT_CHARS),
            summarizer_timeout_secs: env::var("SUMMARIZER_TIMEOUT_SECS")
                .unwrap_or_else(|_| SUMMARIZER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(SUMMARIZER_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.summarizer_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("SUMMARIZER_API_KEY must not be empty"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if self.cache_ttl_secs == 0 || self.cache_max_entries == 0 {
            return Err(anyhow::anyhow!(
                "CACHE_TTL_SECS and CACHE_MAX_ENTRIES must be greater than 0"
            ));
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
