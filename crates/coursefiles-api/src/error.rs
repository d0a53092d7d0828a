//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. An [`AppError`]
//! renders with the status, code and log level it declares for itself.

use axum::{
    extract::{multipart::MultipartError, rejection::QueryRejection, FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use coursefiles_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so that `IntoResponse` can be implemented for the core error type.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

/// Malformed query strings are client input errors, rendered in the JSON error shape.
impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid query string: {}",
            rejection.body_text()
        )))
    }
}

/// Query extractor that rejects with [`ErrorResponse`] instead of axum's plain-text body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ValidatedQuery(inner))
    }
}

/// Classify a multipart read failure; an oversized body is a rejected upload.
pub fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UpstreamRejected(format!("Upload too large: {}", err.body_text()))
    } else {
        AppError::InvalidInput(format!("Invalid multipart body: {}", err.body_text()))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| {
            let env = env.to_lowercase();
            env == "production" || env == "prod"
        })
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details never leave the process in production or for sensitive errors
        let show_details = !is_production_env() && !app_error.is_sensitive();

        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        (status, Json(body)).into_response()
    }
}
