//! Coursefiles Services Library
//!
//! The metadata cache and the file lifecycle service that keeps it consistent
//! with the record store while tracking description jobs.

pub mod cache;
pub mod lifecycle;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use cache::{CacheBackend, CacheError, CacheLookup, MemoryCacheBackend, MetadataCache};
pub use lifecycle::{FileLifecycleService, LifecycleSettings};
