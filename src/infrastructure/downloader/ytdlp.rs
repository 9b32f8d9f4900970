//! Video download and metadata lookup through yt-dlp.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

use super::{DownloadedVideo, VideoDownloader, VideoInfo};
use crate::common::error::{AppError, AppResult};
use crate::common::time::TimeRange;
use crate::config::settings::AppConfig;
use crate::infrastructure::process::run_tool;

const TOOL: &str = "yt-dlp";

/// Prefer MP4/M4A so the merge step rarely has to remux.
const FORMAT_SELECTOR: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b";

#[derive(Clone)]
pub struct YtDlp {
    bin: String,
}

/// Subset of the yt-dlp info JSON we read.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YtDlpMetadata {
    title: Option<String>,
    ext: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    uploader: Option<String>,
    extractor: Option<String>,
    webpage_url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl YtDlp {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bin: config.ytdlp_bin.clone(),
        }
    }
}

/// `--download-sections` value for a trim window; `None` for the full video.
pub fn section_spec(range: &TimeRange) -> Option<String> {
    if range.is_full() {
        return None;
    }
    let start = range.start.unwrap_or(0);
    let end = range
        .end
        .map(|e| e.to_string())
        .unwrap_or_else(|| "inf".to_string());
    Some(format!("*{}-{}", start, end))
}

pub fn download_args(url: &str, output_stem: &Path, range: &TimeRange) -> Vec<String> {
    let template = format!("{}.%(ext)s", output_stem.display());

    let mut args: Vec<String> = [
        "--no-playlist",
        "--no-progress",
        "--no-warnings",
        "--dump-json",
        "--no-simulate",
        "-f",
        FORMAT_SELECTOR,
        "--merge-output-format",
        "mp4",
        "-o",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(template);

    if let Some(section) = section_spec(range) {
        args.push("--download-sections".to_string());
        args.push(section);
        args.push("--force-keyframes-at-cuts".to_string());
    }

    args.push("--".to_string());
    args.push(url.to_string());
    args
}

fn parse_metadata(stdout: &[u8]) -> AppResult<YtDlpMetadata> {
    // --dump-json prints one object per line; the last one describes the
    // finished download.
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| AppError::tool(TOOL, "no metadata in output"))?;

    serde_json::from_str(line)
        .map_err(|e| AppError::tool(TOOL, format!("unreadable metadata: {}", e)))
}

#[async_trait]
impl VideoDownloader for YtDlp {
    async fn fetch_info(&self, url: &str) -> AppResult<VideoInfo> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["--dump-single-json", "--no-playlist", "--skip-download", "--no-warnings", "--", url]);

        let output = run_tool(TOOL, cmd).await?;
        let meta = parse_metadata(&output.stdout)?;

        Ok(VideoInfo {
            title: meta.title.unwrap_or_else(|| "video".to_string()),
            duration: meta.duration,
            thumbnail: meta.thumbnail,
            uploader: meta.uploader,
            extractor: meta.extractor,
            webpage_url: meta.webpage_url,
            width: meta.width,
            height: meta.height,
        })
    }

    async fn download(&self, url: &str, output_stem: &Path, range: &TimeRange) -> AppResult<DownloadedVideo> {
        info!("Downloading {} to {}.*", url, output_stem.display());

        let mut cmd = Command::new(&self.bin);
        cmd.args(download_args(url, output_stem, range));

        let output = run_tool(TOOL, cmd).await?;
        let meta = parse_metadata(&output.stdout)?;

        Ok(DownloadedVideo {
            title: meta.title.unwrap_or_else(|| "video".to_string()),
            ext: meta.ext,
        })
    }
}
