//! Application state shared by every handler.

use coursefiles_core::Config;
use coursefiles_services::FileLifecycleService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub files: Arc<FileLifecycleService>,
}

impl AppState {
    pub fn new(config: Config, files: Arc<FileLifecycleService>) -> Arc<Self> {
        Arc::new(Self { config, files })
    }
}
