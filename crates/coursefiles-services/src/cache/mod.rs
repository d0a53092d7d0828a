//! Metadata cache
//
// Backend seam (key/value with per-entry TTL)
pub mod backend;
//
// In-process Moka backend
pub mod memory;
//
// Typed cache of FileRecord snapshots
pub mod metadata;

pub use backend::{CacheBackend, CacheError, CacheResult};
pub use memory::MemoryCacheBackend;
pub use metadata::{CacheLookup, MetadataCache};
