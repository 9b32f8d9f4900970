use utoipa::OpenApi;
use crate::common::response::ErrorResponse;
use crate::infrastructure::downloader::VideoInfo;
use crate::modules::video::dto::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::index,
        crate::modules::video::handler::upload_background,
        crate::modules::video::handler::video_info,
        crate::modules::video::handler::prepare_video,
        crate::modules::video::handler::download_video,
        crate::modules::video::stream_handler::serve_file,
    ),
    components(
        schemas(
            PrepareResponse, RenderResponse, UploadResponse, VideoInfo, ErrorResponse,
        )
    ),
    tags(
        (name = "Video", description = "Download, crop and caption vertical clips"),
        (name = "Frontend", description = "Bundled web page")
    )
)]
pub struct ApiDoc;
