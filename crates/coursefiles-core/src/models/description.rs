//! Description job models
//!
//! A description is produced out-of-band by the summarization service. The
//! record only stores the [`JobHandle`]; the job's state is recovered by
//! polling.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Opaque reference to a submitted summarization job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        JobHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for JobHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// State of a description job as observed by a single poll.
///
/// `Pending` moves to `Ready` or `Failed`; both are terminal until a new
/// handle is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionState {
    Pending,
    Ready(String),
    Failed(String),
}

impl DescriptionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DescriptionState::Pending)
    }
}

/// Successful outcome of reading a file description.
///
/// A failed job is reported as `AppError::JobFailed`, so this type can never
/// carry both a processing indicator and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DescriptionStatus {
    Processing,
    Ready { text: String },
}

impl DescriptionStatus {
    pub fn text(&self) -> Option<&str> {
        match self {
            DescriptionStatus::Processing => None,
            DescriptionStatus::Ready { text } => Some(text),
        }
    }
}
