use crate::error::{multipart_error, ErrorResponse, HttpAppError, ValidatedQuery};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use coursefiles_core::models::{
    DescriptionStatus, FileFilter, FileListPage, FileRecord, JobHandle, UploadedFile,
};
use coursefiles_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Description payload. `text` is present only when `status` is `ready`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DescriptionResponse {
    pub id: i32,
    /// `processing` or `ready`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DescriptionJobResponse {
    pub id: i32,
    #[schema(value_type = String)]
    pub job: JobHandle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadLinkResponse {
    pub id: i32,
    pub url: String,
    pub expires_in_secs: u64,
}

fn parse_file_id(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::InvalidInput(format!("Invalid file id: {}", raw)))
}

fn parse_owner_id(field: &str, raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::InvalidInput(format!("{} must be an integer", field)))
}

/// Read the `file`, `user_id` and `course_id` fields of an upload form.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut user_id = None;
    let mut course_id = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidInput("File field has no filename".into()))?;
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, data.to_vec()));
            }
            Some("user_id") => {
                let raw = field.text().await.map_err(multipart_error)?;
                user_id = Some(parse_owner_id("user_id", &raw)?);
            }
            Some("course_id") => {
                let raw = field.text().await.map_err(multipart_error)?;
                course_id = Some(parse_owner_id("course_id", &raw)?);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::InvalidInput("Missing file field".into()))?;

    Ok(UploadedFile {
        file_name,
        data,
        user_id: user_id.ok_or_else(|| AppError::InvalidInput("Missing user_id".into()))?,
        course_id: course_id.ok_or_else(|| AppError::InvalidInput("Missing course_id".into()))?,
    })
}

#[utoipa::path(
    get,
    path = "/v1/files",
    tag = "files",
    params(FileFilter),
    responses(
        (status = 200, description = "Matching files, newest first", body = FileListPage),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(filter): ValidatedQuery<FileFilter>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = state.files.list(filter).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/v1/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored and description job started", body = FileRecord),
        (status = 400, description = "Malformed owner ids or file name", body = ErrorResponse),
        (status = 422, description = "File too large or unsupported type", body = ErrorResponse),
        (status = 503, description = "A backend is unavailable", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = read_upload(multipart).await?;
    let record = state.files.create(upload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/v1/files/{id}",
    tag = "files",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileRecord),
        (status = 400, description = "Invalid file id", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;
    let record = state.files.read_detail(id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/v1/files/{id}/description",
    tag = "files",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "Description is ready", body = DescriptionResponse),
        (status = 202, description = "Description job still processing", body = DescriptionResponse),
        (status = 404, description = "File or job not found", body = ErrorResponse),
        (status = 502, description = "Description job failed", body = ErrorResponse)
    )
)]
pub async fn get_description(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;

    let response = match state.files.read_description(id).await? {
        DescriptionStatus::Processing => (
            StatusCode::ACCEPTED,
            Json(DescriptionResponse {
                id,
                status: "processing".to_string(),
                code: Some("JOB_PROCESSING".to_string()),
                text: None,
            }),
        ),
        DescriptionStatus::Ready { text } => (
            StatusCode::OK,
            Json(DescriptionResponse {
                id,
                status: "ready".to_string(),
                code: None,
                text: Some(text),
            }),
        ),
    };

    Ok(response)
}

#[utoipa::path(
    post,
    path = "/v1/files/{id}/description",
    tag = "files",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 202, description = "New description job started", body = DescriptionJobResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 503, description = "A backend is unavailable", body = ErrorResponse)
    )
)]
pub async fn regenerate_description(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;
    let job = state.files.update_description(id).await?;
    Ok((StatusCode::ACCEPTED, Json(DescriptionJobResponse { id, job })))
}

#[utoipa::path(
    get,
    path = "/v1/files/{id}/download",
    tag = "files",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "Time-limited download URL", body = DownloadLinkResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_download_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;
    let url = state.files.download_link(id).await?;

    Ok(Json(DownloadLinkResponse {
        id,
        url,
        expires_in_secs: state.config.download_url_ttl_secs(),
    }))
}

#[utoipa::path(
    delete,
    path = "/v1/files/{id}",
    tag = "files",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 503, description = "A backend is unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;
    state.files.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_id() {
        assert_eq!(parse_file_id("42").unwrap(), 42);
        assert_eq!(parse_file_id(" 7 ").unwrap(), 7);
        assert!(matches!(
            parse_file_id("abc"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(parse_file_id("99999999999").is_err());
    }

    #[test]
    fn test_parse_owner_id_names_the_field() {
        match parse_owner_id("course_id", "x") {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("course_id")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
