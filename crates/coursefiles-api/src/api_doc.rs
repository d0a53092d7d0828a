//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use coursefiles_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coursefiles API",
        version = "0.1.0",
        description = "Course file storage with asynchronously generated descriptions. All endpoints are versioned under /v1/."
    ),
    paths(
        handlers::files::list_files,
        handlers::files::upload_file,
        handlers::files::get_file,
        handlers::files::get_description,
        handlers::files::regenerate_description,
        handlers::files::get_download_link,
        handlers::files::delete_file,
    ),
    components(schemas(
        models::FileRecord,
        models::FileListPage,
        handlers::files::DescriptionResponse,
        handlers::files::DescriptionJobResponse,
        handlers::files::DownloadLinkResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "files", description = "Course file lifecycle")
    )
)]
pub struct ApiDoc;
