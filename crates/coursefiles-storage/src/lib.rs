//! Coursefiles Storage Library
//!
//! Blob storage for uploaded course files. It provides the [`BlobStore`]
//! trait with S3 (via `object_store`) and local filesystem implementations.
//!
//! # Storage key format
//!
//! Keys are derived from the owner and the file name:
//! `{user_id}-{course_id}-{file_name}`. Uploading the same name for the same
//! user and course overwrites the previous blob. Key derivation lives in the
//! `keys` module so every backend agrees on it.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use coursefiles_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{blob_key, content_disposition, content_type_for};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{BlobStore, StorageError, StorageResult};
