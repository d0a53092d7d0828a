use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

use super::backend::{CacheBackend, CacheResult};

#[derive(Clone)]
struct CacheEntry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with; a rewrite restarts the clock.
struct WriteTtl;

impl Expiry<String, CacheEntry> for WriteTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process cache backend on Moka, bounded by entry count.
#[derive(Clone)]
pub struct MemoryCacheBackend {
    entries: Cache<String, CacheEntry>,
}

impl MemoryCacheBackend {
    pub fn new(max_entries: usize) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries.max(1) as u64)
            .expire_after(WriteTtl)
            .name("file_metadata_cache")
            .build();

        Self { entries }
    }

    /// Approximate entry count after pending evictions are applied.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), CacheEntry { value, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
