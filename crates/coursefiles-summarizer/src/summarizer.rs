use async_trait::async_trait;
use coursefiles_core::models::{DescriptionState, JobHandle};
use coursefiles_core::{AppError, Backend};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Summarization request failed: {0}")]
    Request(String),

    #[error("Summarization service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Summarization job {0} not found")]
    JobNotFound(String),

    #[error("Invalid summarization response: {0}")]
    InvalidResponse(String),
}

impl From<SummarizerError> for AppError {
    fn from(err: SummarizerError) -> Self {
        match err {
            SummarizerError::JobNotFound(id) => {
                AppError::NotFound(format!("Description job {} not found", id))
            }
            other => AppError::backend(Backend::Summarizer, other.to_string()),
        }
    }
}

pub type SummarizerResult<T> = Result<T, SummarizerError>;

/// Asynchronous summarization service.
///
/// `poll` performs exactly one round-trip; callers decide when to ask again.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Submit `content` for analysis and return the job handle.
    async fn submit(&self, content: &str) -> SummarizerResult<JobHandle>;

    /// Observe the current state of a previously submitted job.
    async fn poll(&self, job: &JobHandle) -> SummarizerResult<DescriptionState>;
}
