use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod service;
pub mod stream_handler;

pub fn router(state: &AppState) -> Router<AppState> {
    let upload_routes = Router::new()
        .route("/upload-bg", post(handler::upload_background))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        .route("/", get(handler::index))
        .route("/info", get(handler::video_info))
        .route("/prepare", post(handler::prepare_video))
        .route("/download", post(handler::download_video))
        .route("/file/{name}", get(stream_handler::serve_file))
        .merge(upload_routes)
}
