//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use coursefiles_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    let blobs = coursefiles_storage::create_storage(&config)
        .await
        .context("Failed to initialize blob storage")?;
    tracing::info!(backend = %blobs.backend_type(), "Blob storage initialized");

    let files = services::build_file_service(&config, pool, blobs)?;
    let state = AppState::new(config.clone(), files);

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
