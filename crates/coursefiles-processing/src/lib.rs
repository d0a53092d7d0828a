//! Coursefiles Processing Library
//!
//! Upload validation and text extraction. Everything here runs before any
//! backend is touched, so a rejected upload leaves no trace.

pub mod extract;
pub mod validator;

pub use extract::{extract_text, ExtractionError};
pub use validator::{UploadValidator, ValidationError};
