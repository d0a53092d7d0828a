//! Coursefiles API Library
//!
//! HTTP handlers over the file lifecycle service, plus application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
