use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppResult;
use crate::common::time::TimeRange;

pub mod ytdlp;

pub use ytdlp::YtDlp;

/// What the downloader reports about a finished download.
#[derive(Debug, Clone)]
pub struct DownloadedVideo {
    pub title: String,
    /// Extension of the written file as reported by the tool. May disagree
    /// with what actually landed on disk.
    pub ext: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoInfo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Metadata only, nothing is written to disk.
    async fn fetch_info(&self, url: &str) -> AppResult<VideoInfo>;

    /// Downloads `url` to `{output_stem}.{ext}`, trimmed to `range`.
    async fn download(&self, url: &str, output_stem: &Path, range: &TimeRange) -> AppResult<DownloadedVideo>;
}
