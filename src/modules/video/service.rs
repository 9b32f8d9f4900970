use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};
use url::Url;

use super::dto::{PrepareQuery, PrepareResponse, RenderQuery, RenderResponse};
use super::model::{BackgroundKind, CropRect, GradientAngle, Platform, Rgb};
use crate::common::error::{AppError, AppResult};
use crate::common::time::TimeRange;
use crate::infrastructure::downloader::VideoInfo;
use crate::infrastructure::media::CompositeJob;
use crate::infrastructure::storage::{JobId, JobStore};
use crate::state::AppState;

const PREPARED_NOT_FOUND: &str = "Prepared video not found";
const DEFAULT_TITLE: &str = "video";

enum Source<'a> {
    Prepared { raw: PathBuf, title: String },
    Fresh(&'a str),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_or<T: FromStr<Err = AppError>>(value: &Option<String>, default: &str) -> AppResult<T> {
    non_empty(value).unwrap_or(default).parse()
}

pub fn validate_source_url(raw: &str) -> AppResult<()> {
    let url = Url::parse(raw.trim()).map_err(|_| AppError::invalid_input("Invalid URL"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(AppError::invalid_input("Only http(s) URLs are supported")),
    }
}

async fn remove_if_exists(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}

pub struct VideoService;

impl VideoService {
    pub async fn info(state: AppState, url: &str) -> AppResult<VideoInfo> {
        validate_source_url(url)?;
        state.downloader.fetch_info(url.trim()).await
    }

    /// Downloads the (trimmed) source and extracts a preview frame for crop
    /// selection. Nothing of the job survives a failure.
    pub async fn prepare(state: AppState, req: PrepareQuery) -> AppResult<PrepareResponse> {
        validate_source_url(&req.url)?;
        let range = TimeRange::parse(req.start_time.as_deref(), req.end_time.as_deref())?;

        let id = JobId::new();
        let preview = state.store.preview_path(id);

        let mut guard = state.store.guard(id);
        guard.track_prefix(JobStore::raw_prefix(id));
        guard.track(&preview);

        info!("Job {}: preparing {} [{}]", id, req.url, range);
        let (raw, title) = Self::download_raw(&state, id, req.url.trim(), &range).await?;

        info!("Job {}: extracting preview frame", id);
        let (width, height) = state.preview.extract(&raw, &preview).await?;

        guard.commit();
        info!("Job {}: prepared {}x{} \"{}\"", id, width, height, title);

        Ok(PrepareResponse {
            video_id: id.to_string(),
            title,
            preview: JobStore::preview_name(id),
            width,
            height,
        })
    }

    /// Produces `{id}.mp4` from a prepared job or a fresh download. On
    /// failure the job's raw and final files are removed.
    pub async fn render(state: AppState, req: RenderQuery) -> AppResult<RenderResponse> {
        let crop = CropRect::new(req.crop_x, req.crop_y, req.crop_w, req.crop_h)?;
        let platform: Platform = parse_or(&req.platform, &state.config.default_platform)?;
        let color1: Rgb = parse_or(&req.color1, &state.config.default_color1)?;
        let color2: Rgb = parse_or(&req.color2, &state.config.default_color2)?;
        let gradient_angle: GradientAngle = parse_or(&req.gradient_angle, "diagonal-br")?;
        let bg_kind: BackgroundKind = parse_or(&req.bg_type, "gradient")?;
        let range = TimeRange::parse(req.start_time.as_deref(), req.end_time.as_deref())?;

        let background_image = match (bg_kind, non_empty(&req.bg_image_id)) {
            (BackgroundKind::Image, Some(name)) => Some(Self::resolve_background(&state, name).await?),
            _ => None,
        };

        let (id, source) = match (non_empty(&req.video_id), non_empty(&req.url)) {
            (Some(video_id), _) => {
                let id = JobId::parse(video_id).map_err(|_| AppError::not_found(PREPARED_NOT_FOUND))?;
                // Looked up before the guard is armed; a repeated render must
                // leave an existing output alone.
                let raw = state
                    .store
                    .locate_raw(id, None)
                    .await?
                    .ok_or_else(|| AppError::not_found(PREPARED_NOT_FOUND))?;
                let title = state.store.title(id).unwrap_or_else(|| DEFAULT_TITLE.to_string());
                (id, Source::Prepared { raw, title })
            }
            (None, Some(url)) => {
                validate_source_url(url)?;
                (JobId::new(), Source::Fresh(url))
            }
            (None, None) => return Err(AppError::invalid_input("Either url or video_id required")),
        };

        let output = state.store.output_path(id);

        let mut guard = state.store.guard(id);
        guard.track_prefix(JobStore::raw_prefix(id));
        guard.track(&output);

        let (raw, title) = match source {
            Source::Prepared { raw, title } => (raw, title),
            Source::Fresh(url) => {
                info!("Job {}: downloading {} [{}]", id, url, range);
                Self::download_raw(&state, id, url, &range).await?
            }
        };

        let formatted = state.formatter.format(&req.overlay_text).await?;
        let username = req.username.trim();

        if formatted.body.is_empty() && username.is_empty() {
            info!("Job {}: no caption, publishing raw file", id);
            tokio::fs::rename(&raw, &output).await?;
        } else {
            info!("Job {}: compositing template", id);
            let job = CompositeJob {
                input: raw.clone(),
                output: output.clone(),
                scratch_stem: state.store.scratch_stem(id),
                title: formatted.title,
                body: formatted.body,
                username: username.to_string(),
                platform,
                color1,
                color2,
                background_image,
                gradient_angle,
                crop,
            };
            state.compositor.compose(&job).await?;

            remove_if_exists(&raw).await;
            remove_if_exists(&state.store.preview_path(id)).await;
        }

        guard.commit();
        state.store.forget(id);
        info!("Job {}: rendered {}", id, JobStore::output_name(id));

        Ok(RenderResponse {
            file: JobStore::output_name(id),
            title,
        })
    }

    async fn download_raw(
        state: &AppState,
        id: JobId,
        url: &str,
        range: &TimeRange,
    ) -> AppResult<(PathBuf, String)> {
        let downloaded = state
            .downloader
            .download(url, &state.store.raw_stem(id), range)
            .await?;

        let raw = state
            .store
            .locate_raw(id, downloaded.ext.as_deref())
            .await?
            .ok_or_else(|| AppError::tool("yt-dlp", "downloaded file not found"))?;

        state.store.record_raw(id, raw.clone(), Some(downloaded.title.clone()));
        Ok((raw, downloaded.title))
    }

    async fn resolve_background(state: &AppState, name: &str) -> AppResult<PathBuf> {
        if !name.starts_with("bg_") {
            return Err(AppError::invalid_input("Invalid background image id"));
        }
        let path = state.store.resolve_name(name)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(AppError::not_found("Background image not found"));
        }
        Ok(path)
    }
}
