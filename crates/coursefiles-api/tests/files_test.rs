//! File API tests over in-memory collaborators.
//!
//! Run with: `cargo test -p coursefiles-api --test files_test`

mod helpers;

use helpers::{api_path, setup_test_app, upload_form};
use serde_json::Value;

#[tokio::test]
async fn test_upload_then_description_lifecycle() {
    let app = setup_test_app();
    let client = &app.server;

    let response = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"Lifetimes and borrowing", "1", "2"))
        .await;
    assert_eq!(response.status_code(), 201);
    let record: Value = response.json();
    let id = record["id"].as_i64().expect("Expected numeric id");
    assert_eq!(record["file_name"], "notes.txt");
    assert_eq!(record["file_type"], ".txt");
    assert_eq!(record["storage_key"], "1-2-notes.txt");

    let response = client
        .get(&api_path(&format!("/files/{}/description", id)))
        .await;
    assert_eq!(response.status_code(), 202);
    let body: Value = response.json();
    assert_eq!(body["code"], "JOB_PROCESSING");
    assert!(body.get("text").is_none());

    let job = record["description_job"].as_str().expect("Expected job handle");
    app.ctx
        .summarizer
        .complete(&coursefiles_core::models::JobHandle::new(job), "Covers ownership.");

    let response = client
        .get(&api_path(&format!("/files/{}/description", id)))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["text"], "Covers ownership.");
}

#[tokio::test]
async fn test_get_file_and_download_link() {
    let app = setup_test_app();
    let client = &app.server;

    let record: Value = client
        .post(&api_path("/files"))
        .multipart(upload_form("syllabus.md", b"# Syllabus", "3", "4"))
        .await
        .json();
    let id = record["id"].as_i64().expect("Expected numeric id");

    let response = client.get(&api_path(&format!("/files/{}", id))).await;
    assert_eq!(response.status_code(), 200);
    let fetched: Value = response.json();
    assert_eq!(fetched, record);

    let response = client
        .get(&api_path(&format!("/files/{}/download", id)))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let url = body["url"].as_str().expect("Expected url");
    assert!(url.contains("3-4-syllabus.md"));
    assert_eq!(body["expires_in_secs"], 3600);
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let app = setup_test_app();
    let client = &app.server;

    let record: Value = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"content", "1", "2"))
        .await
        .json();
    let id = record["id"].as_i64().expect("Expected numeric id");

    let response = client.delete(&api_path(&format!("/files/{}", id))).await;
    assert_eq!(response.status_code(), 204);

    let response = client.get(&api_path(&format!("/files/{}", id))).await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_regenerate_description_returns_new_job() {
    let app = setup_test_app();
    let client = &app.server;

    let record: Value = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"content", "1", "2"))
        .await
        .json();
    let id = record["id"].as_i64().expect("Expected numeric id");

    let response = client
        .post(&api_path(&format!("/files/{}/description", id)))
        .await;
    assert_eq!(response.status_code(), 202);
    let body: Value = response.json();
    assert_ne!(body["job"], record["description_job"]);

    let fetched: Value = client
        .get(&api_path(&format!("/files/{}", id)))
        .await
        .json();
    assert_eq!(fetched["description_job"], body["job"]);
}

#[tokio::test]
async fn test_failed_job_is_bad_gateway() {
    let app = setup_test_app();
    let client = &app.server;

    let record: Value = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"content", "1", "2"))
        .await
        .json();
    let id = record["id"].as_i64().expect("Expected numeric id");
    let job = record["description_job"].as_str().expect("Expected job handle");
    app.ctx
        .summarizer
        .fail(&coursefiles_core::models::JobHandle::new(job), "model error");

    let response = client
        .get(&api_path(&format!("/files/{}/description", id)))
        .await;
    assert_eq!(response.status_code(), 502);
    let body: Value = response.json();
    assert_eq!(body["code"], "JOB_FAILED");
}

#[tokio::test]
async fn test_invalid_identifiers_are_bad_requests() {
    let app = setup_test_app();
    let client = &app.server;

    let response = client.get(&api_path("/files/abc")).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");

    let response = client.get(&api_path("/files/0")).await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .get(&api_path("/files"))
        .add_query_param("user_id", "abc")
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");

    let response = client
        .get(&api_path("/files"))
        .add_query_param("pageNum", "9223372036854775807")
        .await;
    assert_eq!(response.status_code(), 200);
    let page: Value = response.json();
    assert_eq!(page["data"].as_array().map(Vec::len), Some(0));

    let response = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"content", "abc", "2"))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"content", "0", "2"))
        .await;
    assert_eq!(response.status_code(), 400);

    assert!(app.ctx.blobs.is_empty());
    assert!(app.ctx.records.is_empty());
}

#[tokio::test]
async fn test_unsupported_upload_is_unprocessable() {
    let app = setup_test_app();
    let client = &app.server;

    let response = client
        .post(&api_path("/files"))
        .multipart(upload_form("photo.png", b"\x89PNG", "1", "2"))
        .await;
    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_REJECTED");
    assert!(app.ctx.blobs.is_empty());
}

#[tokio::test]
async fn test_backend_outage_is_service_unavailable() {
    let app = setup_test_app();
    let client = &app.server;
    app.ctx.summarizer.fail_submissions(true);

    let response = client
        .post(&api_path("/files"))
        .multipart(upload_form("notes.txt", b"content", "1", "2"))
        .await;
    assert_eq!(response.status_code(), 503);
    let body: Value = response.json();
    assert_eq!(body["code"], "BACKEND_UNAVAILABLE");
    assert_eq!(body["recoverable"], true);
    // Sensitive errors never carry internal details
    assert!(body.get("details").is_none());
    assert!(app.ctx.records.is_empty());
}

#[tokio::test]
async fn test_list_files_with_filter() {
    let app = setup_test_app();
    let client = &app.server;

    for (name, course) in [("a.txt", "2"), ("b.txt", "2"), ("c.txt", "5")] {
        client
            .post(&api_path("/files"))
            .multipart(upload_form(name, b"content", "1", course))
            .await;
    }

    let response = client
        .get(&api_path("/files"))
        .add_query_param("course_id", 2)
        .add_query_param("pageSize", 1)
        .await;
    assert_eq!(response.status_code(), 200);
    let page: Value = response.json();
    assert_eq!(page["total"], 2);
    assert_eq!(page["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app();

    let response = app.server.get("/live").await;
    assert_eq!(response.status_code(), 200);

    let response = app.server.get("/ready").await;
    assert_eq!(response.status_code(), 200);

    app.ctx.records.fail_requests(true);
    let response = app.server.get("/ready").await;
    assert_eq!(response.status_code(), 503);
}
