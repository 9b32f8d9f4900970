use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

use super::error::AppError;

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

pub struct ApiError(pub String, pub StatusCode);

impl ApiError {
    /// Request-level failure of a processing flow. Every error kind is a 400
    /// there, including a missing prepared video.
    pub fn bad_request(err: AppError) -> Self {
        ApiError(err.to_string(), StatusCode::BAD_REQUEST)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = err.status_code();
        ApiError(err.to_string(), status)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (detail, status) = (self.0, self.1);
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(rejection.body_text(), StatusCode::BAD_REQUEST)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError(errors.to_string(), StatusCode::BAD_REQUEST)
    }
}
