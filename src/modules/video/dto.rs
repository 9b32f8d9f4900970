use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

fn full_percent() -> f64 {
    100.0
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InfoQuery {
    /// Source video URL
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PrepareQuery {
    /// Source video URL
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    /// `HH:MM:SS` or `MM:SS`; start of video when absent
    pub start_time: Option<String>,
    /// `HH:MM:SS` or `MM:SS`; end of video when absent
    pub end_time: Option<String>,
}

/// Options for one render. Either `video_id` (from `/prepare`) or `url`.
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RenderQuery {
    pub url: Option<String>,
    pub video_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub overlay_text: String,
    #[serde(default)]
    pub username: String,
    /// instagram, tiktok, youtube, twitter or facebook
    pub platform: Option<String>,
    /// `#RRGGBB`
    pub color1: Option<String>,
    /// `#RRGGBB`
    pub color2: Option<String>,
    /// `gradient` (default) or `image`
    pub bg_type: Option<String>,
    /// Id returned by `/upload-bg`
    pub bg_image_id: Option<String>,
    /// vertical, horizontal, diagonal-br, diagonal-bl, diagonal-tr, diagonal-tl
    pub gradient_angle: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "crop_x must be between 0 and 100"))]
    pub crop_x: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "crop_y must be between 0 and 100"))]
    pub crop_y: f64,
    #[serde(default = "full_percent")]
    #[validate(range(min = 0.0, max = 100.0, message = "crop_w must be between 0 and 100"))]
    pub crop_w: f64,
    #[serde(default = "full_percent")]
    #[validate(range(min = 0.0, max = 100.0, message = "crop_h must be between 0 and 100"))]
    pub crop_h: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrepareResponse {
    pub video_id: String,
    pub title: String,
    /// File name of the preview frame, fetch via `/file/{name}`
    pub preview: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenderResponse {
    /// File name of the final video, fetch via `/file/{name}`
    pub file: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub id: String,
}
