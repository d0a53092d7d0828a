//! Domain models

pub mod description;
pub mod file;

pub use description::{DescriptionState, DescriptionStatus, JobHandle};
pub use file::{
    file_type_from_name, FileFilter, FileListPage, FileRecord, NewFileRecord, UploadedFile,
};
