//! Test helpers: an API router over the in-memory lifecycle fakes.
//!
//! Run from workspace root: `cargo test -p coursefiles-api`. No database or
//! network access is needed.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use coursefiles_api::setup::routes;
use coursefiles_api::AppState;
use coursefiles_core::{BaseConfig, Config, FileServiceConfig, StorageBackend};
use coursefiles_services::test_helpers::{TestContext, TEST_EXTENSIONS, TEST_MAX_FILE_SIZE};

pub fn api_path(path: &str) -> String {
    format!("{}{}", coursefiles_core::constants::API_PREFIX, path)
}

pub fn create_test_config() -> Config {
    Config(Box::new(FileServiceConfig {
        base: BaseConfig {
            server_port: 4000,
            environment: "test".to_string(),
            request_timeout_secs: 30,
        },
        database_url: "postgres://localhost/coursefiles_test".to_string(),
        db_max_connections: 5,
        db_timeout_seconds: 30,
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some("/tmp/coursefiles-test".to_string()),
        local_storage_base_url: Some("http://localhost:4000/blobs".to_string()),
        download_url_ttl_secs: 3600,
        max_file_size_bytes: TEST_MAX_FILE_SIZE,
        allowed_extensions: TEST_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        cache_ttl_secs: 1200,
        cache_max_entries: 100,
        summarizer_api_key: "test-key".to_string(),
        summarizer_base_url: "http://localhost:9".to_string(),
        summarizer_model: "glm-4-flash".to_string(),
        summarizer_prompt: "Summarize.".to_string(),
        summarizer_max_input_chars: 1000,
        summarizer_timeout_secs: 5,
    }))
}

/// Test application: server plus handles to every fake behind it.
pub struct TestApp {
    pub server: TestServer,
    pub ctx: TestContext,
}

pub fn setup_test_app() -> TestApp {
    let ctx = TestContext::new();
    let config = create_test_config();
    let state = AppState::new(config.clone(), ctx.service.clone());
    let router = routes::setup_routes(&config, state);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, ctx }
}

pub fn upload_form(file_name: &str, data: &[u8], user_id: &str, course_id: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data.to_vec()))
        .file_name(file_name.to_string())
        .mime_type("application/octet-stream");

    MultipartForm::new()
        .add_text("user_id", user_id.to_string())
        .add_text("course_id", course_id.to_string())
        .add_part("file", part)
}
