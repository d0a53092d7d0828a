//! Coursefiles Database Library
//!
//! Record store for course file metadata. The [`FileRecordStore`] trait is the
//! seam the lifecycle service depends on; [`PgFileRepository`] is the
//! PostgreSQL implementation.

pub mod db;

pub use db::{FileRecordStore, PgFileRepository, RecordStoreError, RecordStoreResult};
