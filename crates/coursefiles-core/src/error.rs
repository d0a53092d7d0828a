//! Error types module
//!
//! All failures surfaced by the file lifecycle operations are unified under
//! [`AppError`]. Each variant describes its own HTTP presentation through the
//! [`ErrorMetadata`] trait so the transport layer never has to guess.
//!
//! A pending description job is deliberately *not* an error; it is reported
//! through `DescriptionStatus::Processing` instead.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Downstream collaborator that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    RecordStore,
    BlobStore,
    Cache,
    Summarizer,
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Backend::RecordStore => write!(f, "record store"),
            Backend::BlobStore => write!(f, "blob store"),
            Backend::Cache => write!(f, "metadata cache"),
            Backend::Summarizer => write!(f, "summarization service"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{backend} unavailable: {message}")]
    BackendUnavailable { backend: Backend, message: String },

    #[error("Description job failed: {0}")]
    JobFailed(String),

    #[error("Upload rejected: {0}")]
    UpstreamRejected(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn backend(backend: Backend, message: impl Into<String>) -> Self {
        AppError::BackendUnavailable {
            backend,
            message: message.into(),
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::BackendUnavailable { .. } => "BackendUnavailable",
            AppError::JobFailed(_) => "JobFailed",
            AppError::UpstreamRejected(_) => "UpstreamRejected",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the file ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::BackendUnavailable { .. } => (
            503,
            "BACKEND_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::JobFailed(_) => (
            502,
            "JOB_FAILED",
            false,
            Some("Request a new description for this file"),
            false,
            LogLevel::Warn,
        ),
        AppError::UpstreamRejected(_) => (
            422,
            "UPSTREAM_REJECTED",
            false,
            Some("Upload a smaller file of a supported type"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::BackendUnavailable { backend, .. } => {
                format!("The {} is temporarily unavailable", backend)
            }
            AppError::JobFailed(_) => "Description generation failed".to_string(),
            AppError::UpstreamRejected(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
