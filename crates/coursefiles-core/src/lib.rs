//! Coursefiles Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by every coursefiles component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, FileServiceConfig};
pub use error::{AppError, Backend, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
