use crate::common::response::{ApiError, ErrorResponse};
use crate::common::upload::{stream_to_disk, upload_extension};
use crate::common::error::AppError;
use crate::infrastructure::downloader::VideoInfo;
use crate::infrastructure::storage::JobStore;
use crate::modules::video::dto::*;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use tracing::{info, warn};
use validator::Validate;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

fn checked<T: Validate>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    let Query(req) = query?;
    req.validate()?;
    Ok(req)
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Frontend page", body = String, content_type = "text/html")
    ),
    tag = "Frontend"
)]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[utoipa::path(
    post,
    path = "/upload-bg",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Background stored", body = UploadResponse),
        (status = 400, description = "Bad Request", body = ErrorResponse)
    ),
    tag = "Video"
)]
pub async fn upload_background(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ApiError(e.body_text(), StatusCode::BAD_REQUEST).into_response(),
        };

        if field.file_name().is_none() {
            continue;
        }

        let name = JobStore::background_name(&upload_extension(field.file_name()));
        let path = state.store.root().join(&name);
        info!("Receiving background upload {}", name);

        return match stream_to_disk(field, &path).await {
            Ok(_) => (StatusCode::OK, Json(UploadResponse { id: name })).into_response(),
            Err(e) => {
                warn!("Background upload failed: {}", e);
                ApiError::bad_request(e).into_response()
            }
        };
    }

    ApiError::bad_request(AppError::invalid_input("No file provided")).into_response()
}

#[utoipa::path(
    get,
    path = "/info",
    params(InfoQuery),
    responses(
        (status = 200, description = "Video metadata", body = VideoInfo),
        (status = 400, description = "Bad Request", body = ErrorResponse)
    ),
    tag = "Video"
)]
pub async fn video_info(
    State(state): State<AppState>,
    query: Result<Query<InfoQuery>, QueryRejection>,
) -> impl IntoResponse {
    let req = match checked(query) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    match VideoService::info(state, &req.url).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => ApiError::bad_request(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/prepare",
    params(PrepareQuery),
    responses(
        (status = 200, description = "Source downloaded, preview ready", body = PrepareResponse),
        (status = 400, description = "Bad Request", body = ErrorResponse)
    ),
    tag = "Video"
)]
pub async fn prepare_video(
    State(state): State<AppState>,
    query: Result<Query<PrepareQuery>, QueryRejection>,
) -> impl IntoResponse {
    let req = match checked(query) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    match VideoService::prepare(state, req).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => {
            warn!("Prepare failed: {}", e);
            ApiError::bad_request(e).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/download",
    params(RenderQuery),
    responses(
        (status = 200, description = "Final video rendered", body = RenderResponse),
        (status = 400, description = "Bad Request", body = ErrorResponse)
    ),
    tag = "Video"
)]
pub async fn download_video(
    State(state): State<AppState>,
    query: Result<Query<RenderQuery>, QueryRejection>,
) -> impl IntoResponse {
    let req = match checked(query) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    match VideoService::render(state, req).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => {
            warn!("Render failed: {}", e);
            ApiError::bad_request(e).into_response()
        }
    }
}
