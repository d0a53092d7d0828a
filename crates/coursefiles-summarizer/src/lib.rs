//! Coursefiles Summarizer Library
//!
//! Client for the asynchronous summarization service that produces file
//! descriptions. Submitting returns a [`JobHandle`](coursefiles_core::models::JobHandle)
//! immediately; the result is fetched later with a single, non-blocking poll.

pub mod glm;
pub mod summarizer;

pub use glm::{interpret_async_result, AsyncResultResponse, GlmConfig, GlmSummarizer};
pub use summarizer::{Summarizer, SummarizerError, SummarizerResult};
