//! Preview extraction and template compositing through the ffmpeg CLI.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use super::gradient::write_gradient_png;
use super::{CompositeJob, PreviewExtractor, TemplateCompositor};
use crate::common::error::{AppError, AppResult};
use crate::config::settings::AppConfig;
use crate::infrastructure::process::run_tool;
use crate::infrastructure::storage::CleanupGuard;
use crate::modules::video::model::{CropRect, Platform};

const TOOL: &str = "ffmpeg";

const TITLE_WRAP: usize = 24;
const BODY_WRAP: usize = 34;

#[derive(Clone)]
pub struct FfmpegPreview {
    bin: String,
}

impl FfmpegPreview {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bin: config.ffmpeg_bin.clone(),
        }
    }
}

#[async_trait]
impl PreviewExtractor for FfmpegPreview {
    async fn extract(&self, video: &Path, output: &Path) -> AppResult<(u32, u32)> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(video)
            // `thumbnail` picks a representative frame instead of a black first one
            .args(["-vf", "thumbnail", "-frames:v", "1", "-q:v", "2"])
            .arg(output);
        run_tool(TOOL, cmd).await?;

        let frame = output.to_path_buf();
        tokio::task::spawn_blocking(move || image::image_dimensions(&frame))
            .await
            .map_err(|e| AppError::tool(TOOL, e.to_string()))?
            .map_err(|e| AppError::tool(TOOL, format!("preview frame unreadable: {}", e)))
    }
}

/// Pixel layout of the vertical template, derived from the canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub box_width: u32,
    pub box_height: u32,
    pub video_bottom: u32,
    pub title_y: u32,
    pub title_size: u32,
    pub body_y: u32,
    pub body_size: u32,
    pub brand_from_bottom: u32,
    pub brand_size: u32,
}

fn even(v: u32) -> u32 {
    v & !1
}

impl Layout {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let margin = width / 18;
        Self {
            width,
            height,
            box_width: even(width.saturating_sub(2 * margin)),
            box_height: even(height * 52 / 100),
            video_bottom: height * 3 / 16,
            title_y: height / 12,
            title_size: width * 6 / 100,
            body_y: height * 7 / 48,
            body_size: width * 41 / 1000,
            brand_from_bottom: height / 10,
            brand_size: width * 37 / 1000,
        }
    }
}

/// Escapes a value for use inside a filtergraph option. Two levels apply:
/// the option parser and the graph parser.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\\\\\"),
            ':' | '\'' => {
                out.push_str("\\\\");
                out.push(ch);
            }
            ',' | ';' | '[' | ']' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Greedy word wrap; existing line breaks are kept.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

pub fn brand_line(username: &str, platform: Platform) -> Option<String> {
    let handle = username.trim().trim_start_matches('@');
    if handle.is_empty() {
        return None;
    }
    Some(format!("@{} · {}", handle, platform.label()))
}

fn crop_filter(crop: &CropRect) -> Option<String> {
    if crop.is_full() {
        return None;
    }
    Some(format!(
        "crop=iw*{}/100:ih*{}/100:iw*{}/100:ih*{}/100",
        crop.w, crop.h, crop.x, crop.y
    ))
}

/// Text overlays resolved to files on disk, top to bottom.
#[derive(Debug, Default, Clone)]
pub struct TextFiles {
    pub title: Option<PathBuf>,
    pub body: Option<PathBuf>,
    pub brand: Option<PathBuf>,
}

pub fn filter_graph(layout: &Layout, crop: &CropRect, font: &str, text: &TextFiles) -> String {
    let (w, h) = (layout.width, layout.height);

    let mut clip = String::from("[0:v]");
    if let Some(c) = crop_filter(crop) {
        clip.push_str(&c);
        clip.push(',');
    }
    clip.push_str(&format!(
        "scale={}:{}:force_original_aspect_ratio=decrease:force_divisible_by=2,setsar=1[clip]",
        layout.box_width, layout.box_height
    ));

    let mut chains = vec![
        format!(
            "[1:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1[bg]"
        ),
        clip,
        format!(
            "[bg][clip]overlay=(W-w)/2:H-h-{}:shortest=1[base]",
            layout.video_bottom
        ),
    ];

    let drawtext = |file: &Path, size: u32, y: String, extra: &str| {
        format!(
            "drawtext={}:textfile={}:expansion=none:fontcolor=white:fontsize={}:x=(w-text_w)/2:y={}:shadowcolor=black@0.45:shadowx=2:shadowy=2{}",
            font,
            escape_filter_value(&file.to_string_lossy()),
            size,
            y,
            extra
        )
    };

    let mut layers = Vec::new();
    if let Some(file) = &text.title {
        layers.push(drawtext(file, layout.title_size, layout.title_y.to_string(), ""));
    }
    if let Some(file) = &text.body {
        let y = if text.title.is_some() { layout.body_y } else { layout.title_y };
        layers.push(drawtext(file, layout.body_size, y.to_string(), ":line_spacing=12"));
    }
    if let Some(file) = &text.brand {
        layers.push(drawtext(
            file,
            layout.brand_size,
            format!("h-{}", layout.brand_from_bottom),
            "",
        ));
    }

    let mut last = String::from("base");
    for (i, layer) in layers.into_iter().enumerate() {
        let label = format!("t{}", i);
        chains.push(format!("[{}]{}[{}]", last, layer, label));
        last = label;
    }
    chains.push(format!("[{}]format=yuv420p[outv]", last));

    chains.join(";")
}

#[derive(Clone)]
pub struct FfmpegCompositor {
    bin: String,
    font: String,
    layout: Layout,
}

impl FfmpegCompositor {
    pub fn new(config: &AppConfig) -> Self {
        let font = match &config.font_file {
            Some(path) => format!("fontfile={}", escape_filter_value(path)),
            None => "font=Sans".to_string(),
        };
        Self {
            bin: config.ffmpeg_bin.clone(),
            font,
            layout: Layout::for_canvas(config.template_width, config.template_height),
        }
    }

    async fn write_text(
        scratch: &mut CleanupGuard,
        path: PathBuf,
        text: Option<String>,
    ) -> AppResult<Option<PathBuf>> {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };
        scratch.track(&path);
        tokio::fs::write(&path, text).await?;
        Ok(Some(path))
    }
}

#[async_trait]
impl TemplateCompositor for FfmpegCompositor {
    async fn compose(&self, job: &CompositeJob) -> AppResult<()> {
        let scratch_root = job
            .output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut scratch = CleanupGuard::scratch(scratch_root);

        let background = match &job.background_image {
            Some(path) => path.clone(),
            None => {
                let path = job.scratch_path("bg.png");
                scratch.track(&path);
                write_gradient_png(
                    &path,
                    self.layout.width,
                    self.layout.height,
                    job.color1,
                    job.color2,
                    job.gradient_angle,
                )
                .await?;
                path
            }
        };

        let text = TextFiles {
            title: Self::write_text(
                &mut scratch,
                job.scratch_path("title.txt"),
                Some(wrap_text(&job.title, TITLE_WRAP)),
            )
            .await?,
            body: Self::write_text(
                &mut scratch,
                job.scratch_path("body.txt"),
                Some(wrap_text(&job.body, BODY_WRAP)),
            )
            .await?,
            brand: Self::write_text(
                &mut scratch,
                job.scratch_path("brand.txt"),
                brand_line(&job.username, job.platform),
            )
            .await?,
        };

        let graph = filter_graph(&self.layout, &job.crop, &self.font, &text);

        info!(
            "Compositing {} -> {} ({}x{})",
            job.input.display(),
            job.output.display(),
            self.layout.width,
            self.layout.height
        );

        let mut cmd = Command::new(&self.bin);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(&job.input)
            .args(["-loop", "1", "-i"])
            .arg(&background)
            .args(["-filter_complex", &graph])
            .args(["-map", "[outv]", "-map", "0:a?"])
            .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "21", "-pix_fmt", "yuv420p"])
            .args(["-c:a", "aac", "-b:a", "160k", "-shortest", "-movflags", "+faststart"])
            .arg(&job.output);

        run_tool(TOOL, cmd).await?;
        Ok(())
    }
}
