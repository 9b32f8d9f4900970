use std::path::Path;

use image::{Rgb as Pixel, RgbImage};

use crate::common::error::{AppError, AppResult};
use crate::modules::video::model::{GradientAngle, Rgb};

/// Linear two-stop gradient across the whole canvas.
pub fn gradient_image(width: u32, height: u32, from: Rgb, to: Rgb, angle: GradientAngle) -> RgbImage {
    let (dx, dy) = angle.direction();
    // Projection starts at the corner opposite the direction vector.
    let sx = if dx < 0.0 { 1.0 } else { 0.0 };
    let sy = if dy < 0.0 { 1.0 } else { 0.0 };
    let norm = dx * dx + dy * dy;

    let span_x = width.saturating_sub(1).max(1) as f32;
    let span_y = height.saturating_sub(1).max(1) as f32;

    RgbImage::from_fn(width, height, |x, y| {
        let px = x as f32 / span_x;
        let py = y as f32 / span_y;
        let t = (((px - sx) * dx + (py - sy) * dy) / norm).clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Pixel([
            mix(from.0[0], to.0[0]),
            mix(from.0[1], to.0[1]),
            mix(from.0[2], to.0[2]),
        ])
    })
}

/// Renders the gradient to a PNG at `path` off the async runtime.
pub async fn write_gradient_png(
    path: &Path,
    width: u32,
    height: u32,
    from: Rgb,
    to: Rgb,
    angle: GradientAngle,
) -> AppResult<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        gradient_image(width, height, from, to, angle)
            .save(&path)
            .map_err(|e| AppError::tool("gradient", e.to_string()))
    })
    .await
    .map_err(|e| AppError::tool("gradient", e.to_string()))?
}
