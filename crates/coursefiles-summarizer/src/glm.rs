// GLM asynchronous chat-completion client

use async_trait::async_trait;
use coursefiles_core::models::{DescriptionState, JobHandle};
use coursefiles_core::Config;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::summarizer::{Summarizer, SummarizerError, SummarizerResult};

/// GLM client configuration
#[derive(Clone)]
pub struct GlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Analysis instruction appended after the file content
    pub prompt: String,
    /// Content beyond this many characters is dropped before submission
    pub max_input_chars: usize,
    pub timeout: Duration,
}

impl GlmConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.summarizer_api_key().to_string(),
            base_url: config.summarizer_base_url().to_string(),
            model: config.summarizer_model().to_string(),
            prompt: config.summarizer_prompt().to_string(),
            max_input_chars: config.summarizer_max_input_chars(),
            timeout: Duration::from_secs(config.summarizer_timeout_secs()),
        }
    }
}

impl Debug for GlmConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_input_chars", &self.max_input_chars)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Summarizer backed by the GLM `async/chat/completions` API.
pub struct GlmSummarizer {
    http_client: Client,
    config: GlmConfig,
}

impl Debug for GlmSummarizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GlmSummarizer")
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
pub struct AsyncResultResponse {
    pub task_status: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Map one async-result payload to a job state.
///
/// `PROCESSING` is pending, `SUCCESS` carries the first choice's content and
/// `FAIL` is terminal. Unknown statuses are treated as failures.
pub fn interpret_async_result(response: &AsyncResultResponse) -> DescriptionState {
    match response.task_status.as_str() {
        "PROCESSING" => DescriptionState::Pending,
        "SUCCESS" => match response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            Some(text) => DescriptionState::Ready(text.to_string()),
            None => DescriptionState::Failed("job completed without content".to_string()),
        },
        "FAIL" => DescriptionState::Failed(
            response
                .error
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| "summarization failed".to_string()),
        ),
        other => DescriptionState::Failed(format!("unexpected task status '{}'", other)),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

impl GlmSummarizer {
    pub fn new(config: GlmConfig) -> SummarizerResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummarizerError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn build_message(&self, content: &str) -> String {
        let content = truncate_chars(content, self.config.max_input_chars);
        format!("{}\n\n{}", content, self.config.prompt)
    }

    async fn error_from_response(response: reqwest::Response) -> SummarizerError {
        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        SummarizerError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl Summarizer for GlmSummarizer {
    #[tracing::instrument(skip(self, content), fields(content_chars = content.chars().count()))]
    async fn submit(&self, content: &str) -> SummarizerResult<JobHandle> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": self.build_message(content) }
            ],
        });

        let response = self
            .http_client
            .post(self.endpoint("async/chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizerError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            tracing::error!(error = %err, "Summarization submit rejected");
            return Err(err);
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;

        let job = JobHandle::new(submitted.id);
        if job.is_empty() {
            return Err(SummarizerError::InvalidResponse(
                "empty task id".to_string(),
            ));
        }

        tracing::info!(job_id = %job, "Summarization job submitted");
        Ok(job)
    }

    #[tracing::instrument(skip(self), fields(job_id = %job))]
    async fn poll(&self, job: &JobHandle) -> SummarizerResult<DescriptionState> {
        let response = self
            .http_client
            .get(self.endpoint(&format!("async-result/{}", job.as_str())))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| SummarizerError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizerError::JobNotFound(job.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let result: AsyncResultResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;

        let state = interpret_async_result(&result);
        tracing::debug!(task_status = %result.task_status, terminal = state.is_terminal(), "Summarization job polled");
        Ok(state)
    }
}
