//! Route configuration and setup.

mod health;

use crate::api_doc::ApiDoc;
use crate::handlers::files;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::get,
    Json, Router,
};
use coursefiles_core::constants::API_PREFIX;
use coursefiles_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Room for multipart framing and the owner fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full router with middleware applied
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let request_timeout = Duration::from_secs(config.request_timeout_secs());
    // Slightly oversized uploads still reach the validator and get a 422
    let body_limit = config
        .max_file_size_bytes()
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    tracing::info!(
        request_timeout_secs = request_timeout.as_secs(),
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    Router::new()
        .nest(API_PREFIX, file_routes())
        .merge(health_routes())
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(setup_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn file_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", get(files::list_files).post(files::upload_file))
        .route(
            "/files/{id}",
            get(files::get_file).delete(files::delete_file),
        )
        .route(
            "/files/{id}/description",
            get(files::get_description)
                .post(files::regenerate_description)
                .put(files::regenerate_description),
        )
        .route("/files/{id}/download", get(files::get_download_link))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::readiness_check))
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check))
}

fn setup_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
