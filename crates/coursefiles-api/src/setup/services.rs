//! Wire the lifecycle service to its production collaborators

use anyhow::{Context, Result};
use coursefiles_core::Config;
use coursefiles_db::PgFileRepository;
use coursefiles_processing::UploadValidator;
use coursefiles_services::{
    FileLifecycleService, LifecycleSettings, MemoryCacheBackend, MetadataCache,
};
use coursefiles_storage::BlobStore;
use coursefiles_summarizer::{GlmConfig, GlmSummarizer};
use sqlx::PgPool;
use std::sync::Arc;

pub fn build_file_service(
    config: &Config,
    pool: PgPool,
    blobs: Arc<dyn BlobStore>,
) -> Result<Arc<FileLifecycleService>> {
    let glm_config = GlmConfig::from_config(config);
    tracing::info!(
        base_url = %glm_config.base_url,
        model = %glm_config.model,
        "Summarizer configured"
    );
    let summarizer =
        GlmSummarizer::new(glm_config).context("Failed to create summarizer client")?;

    let cache = MetadataCache::new(Arc::new(MemoryCacheBackend::new(
        config.cache_max_entries(),
    )));
    tracing::info!(
        max_entries = config.cache_max_entries(),
        ttl_secs = config.cache_ttl_secs(),
        "Metadata cache enabled"
    );

    let service = FileLifecycleService::new(
        Arc::new(PgFileRepository::new(pool)),
        blobs,
        Arc::new(summarizer),
        cache,
        UploadValidator::from_config(config),
        LifecycleSettings::from_config(config),
    );

    Ok(Arc::new(service))
}
