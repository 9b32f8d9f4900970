use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::common::error::AppResult;
use crate::modules::video::model::{CropRect, GradientAngle, Platform, Rgb};

pub mod ffmpeg;
pub mod gradient;

pub use ffmpeg::{FfmpegCompositor, FfmpegPreview};

#[async_trait]
pub trait PreviewExtractor: Send + Sync {
    /// Writes one representative frame of `video` to `output` and returns
    /// its `(width, height)` in pixels.
    async fn extract(&self, video: &Path, output: &Path) -> AppResult<(u32, u32)>;
}

/// Everything the compositor needs for one render.
#[derive(Debug, Clone)]
pub struct CompositeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `{dir}/{job id}`; scratch files are named `{scratch_stem}_<suffix>`.
    pub scratch_stem: PathBuf,
    pub title: String,
    pub body: String,
    pub username: String,
    pub platform: Platform,
    pub color1: Rgb,
    pub color2: Rgb,
    pub background_image: Option<PathBuf>,
    pub gradient_angle: GradientAngle,
    pub crop: CropRect,
}

impl CompositeJob {
    pub fn scratch_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.scratch_stem.clone().into_os_string();
        name.push("_");
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[async_trait]
pub trait TemplateCompositor: Send + Sync {
    /// Renders `job.output`. Scratch files are gone when this returns.
    async fn compose(&self, job: &CompositeJob) -> AppResult<()>;
}
