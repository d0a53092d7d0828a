//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use coursefiles_core::models::FileFilter;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the record store answers a one-row listing.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = FileFilter {
        page_size: Some(1),
        ..Default::default()
    };

    let record_store = match tokio::time::timeout(CHECK_TIMEOUT, state.files.list(probe)).await {
        Ok(Ok(_)) => "ready".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Record store readiness check failed");
            format!("not_ready: {}", e)
        }
        Err(_) => {
            tracing::error!("Record store readiness check timed out");
            "timeout".to_string()
        }
    };

    let ready = record_store == "ready";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "record_store": record_store,
        })),
    )
}
