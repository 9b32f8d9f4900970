use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::common::error::AppError;
use crate::common::response::{ApiError, ErrorResponse};
use crate::state::AppState;

fn quoted_file_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Stream a generated file (preview frame or final video) from the
/// download directory.
#[utoipa::path(
    get,
    path = "/file/{name}",
    params(
        ("name" = String, Path, description = "File name returned by /prepare or /download")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid filename", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    tag = "Video"
)]
pub async fn serve_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let path = state.store.resolve_name(&name)?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found("File not found").into());
        }
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            return Err(AppError::from(e).into());
        }
    };

    let metadata = file.metadata().await.map_err(AppError::from)?;
    if !metadata.is_file() {
        return Err(AppError::not_found("File not found").into());
    }

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(file));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", quoted_file_name(&name)),
        )
        .body(body)
        .unwrap_or_else(|e| {
            error!("Failed to build file response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        });

    Ok(response)
}
