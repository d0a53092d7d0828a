//! Database repositories for data access layer
//
// Course file records
pub mod file;

pub use file::{FileRecordStore, PgFileRepository, RecordStoreError, RecordStoreResult};
