use coursefiles_core::models::FileRecord;
use std::sync::Arc;
use std::time::Duration;

use super::backend::{CacheBackend, CacheError, CacheResult};

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(FileRecord),
    Miss,
}

/// Read-through / write-invalidate cache of file metadata snapshots.
///
/// Absence of an entry says nothing about whether the record exists.
#[derive(Clone)]
pub struct MetadataCache {
    backend: Arc<dyn CacheBackend>,
}

fn cache_key(id: i32) -> String {
    format!("file:{}", id)
}

impl MetadataCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Look up a snapshot. Transport and decode failures count as a miss.
    pub async fn get(&self, id: i32) -> CacheLookup {
        let raw = match self.backend.get(&cache_key(id)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(error = %e, file_id = id, "Metadata cache read failed, treating as miss");
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_str::<FileRecord>(&raw) {
            Ok(record) => CacheLookup::Hit(record),
            Err(e) => {
                tracing::warn!(error = %e, file_id = id, "Discarding undecodable metadata cache entry");
                CacheLookup::Miss
            }
        }
    }

    /// Store a snapshot, replacing any existing entry.
    pub async fn set(&self, id: i32, record: &FileRecord, ttl: Duration) -> CacheResult<()> {
        let raw =
            serde_json::to_string(record).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.backend.set(&cache_key(id), raw, ttl).await
    }

    /// Remove the entry for `id`; succeeds when nothing is cached.
    pub async fn invalidate(&self, id: i32) -> CacheResult<()> {
        self.backend.delete(&cache_key(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheBackend;
    use crate::test_helpers::{sample_record, FailingCacheBackend};

    const TTL: Duration = Duration::from_secs(1200);

    #[tokio::test]
    async fn test_set_then_hit() {
        let cache = MetadataCache::new(Arc::new(MemoryCacheBackend::new(10)));
        let record = sample_record(42);

        assert_eq!(cache.get(42).await, CacheLookup::Miss);
        cache.set(42, &record, TTL).await.unwrap();
        assert_eq!(cache.get(42).await, CacheLookup::Hit(record));
    }

    #[tokio::test]
    async fn test_invalidate_twice_matches_once() {
        let cache = MetadataCache::new(Arc::new(MemoryCacheBackend::new(10)));
        cache.set(42, &sample_record(42), TTL).await.unwrap();

        cache.invalidate(42).await.unwrap();
        let after_once = cache.get(42).await;
        cache.invalidate(42).await.unwrap();
        let after_twice = cache.get(42).await;

        assert_eq!(after_once, CacheLookup::Miss);
        assert_eq!(after_once, after_twice);
    }

    #[tokio::test]
    async fn test_backend_read_failure_is_a_miss() {
        let backend = Arc::new(FailingCacheBackend::new());
        let cache = MetadataCache::new(backend.clone());
        cache.set(42, &sample_record(42), TTL).await.unwrap();

        backend.fail_gets(true);
        assert_eq!(cache.get(42).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_backend_delete_failure_surfaces() {
        let backend = Arc::new(FailingCacheBackend::new());
        let cache = MetadataCache::new(backend.clone());

        backend.fail_deletes(true);
        assert!(matches!(
            cache.invalidate(42).await,
            Err(CacheError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let backend = Arc::new(MemoryCacheBackend::new(10));
        backend
            .set("file:42", "not json".to_string(), TTL)
            .await
            .unwrap();

        let cache = MetadataCache::new(backend);
        assert_eq!(cache.get(42).await, CacheLookup::Miss);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_writers_and_invalidations_never_tear_an_entry() {
        let cache = MetadataCache::new(Arc::new(MemoryCacheBackend::new(10)));
        let versions: Vec<FileRecord> = (0..4)
            .map(|v| FileRecord {
                file_name: format!("lecture-v{}.pdf", v),
                ..sample_record(42)
            })
            .collect();
        let mut tasks = tokio::task::JoinSet::new();

        for record in versions.clone() {
            let cache = cache.clone();
            tasks.spawn(async move {
                for _ in 0..100 {
                    cache.set(42, &record, TTL).await.unwrap();
                    tokio::task::yield_now().await;
                }
                Vec::new()
            });
        }
        {
            let cache = cache.clone();
            tasks.spawn(async move {
                for _ in 0..100 {
                    cache.invalidate(42).await.unwrap();
                    tokio::task::yield_now().await;
                }
                Vec::new()
            });
        }
        for _ in 0..4 {
            let cache = cache.clone();
            tasks.spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    if let CacheLookup::Hit(record) = cache.get(42).await {
                        seen.push(record);
                    }
                    tokio::task::yield_now().await;
                }
                seen
            });
        }

        while let Some(joined) = tasks.join_next().await {
            for record in joined.unwrap() {
                assert!(versions.contains(&record), "unexpected snapshot {:?}", record);
            }
        }

        // Last writer wins once the race settles
        cache.set(42, &versions[3], TTL).await.unwrap();
        assert_eq!(cache.get(42).await, CacheLookup::Hit(versions[3].clone()));
    }
}
