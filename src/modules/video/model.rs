use std::fmt;
use std::str::FromStr;

use crate::common::error::{AppError, AppResult};

/// Crop window in percent of the source frame. Passed through to the
/// compositor exactly as the client chose it on the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

// Tolerates float noise from client-side percentage math.
const CROP_EPSILON: f64 = 1e-6;

impl CropRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> AppResult<Self> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if ![x, y, w, h].into_iter().all(in_range) {
            return Err(AppError::invalid_input("Crop values must be between 0 and 100"));
        }
        if w <= 0.0 || h <= 0.0 {
            return Err(AppError::invalid_input("Crop width and height must be positive"));
        }
        if x + w > 100.0 + CROP_EPSILON || y + h > 100.0 + CROP_EPSILON {
            return Err(AppError::invalid_input("Crop rectangle exceeds the frame"));
        }
        Ok(Self { x, y, w, h })
    }

    pub fn full() -> Self {
        Self { x: 0.0, y: 0.0, w: 100.0, h: 100.0 }
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl FromStr for Rgb {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || AppError::invalid_input(format!("Invalid color: {}", s));
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Instagram,
    TikTok,
    YouTube,
    Twitter,
    Facebook,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Twitter => "X",
            Platform::Facebook => "Facebook",
        }
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" | "ig" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "youtube" | "shorts" => Ok(Platform::YouTube),
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" | "fb" => Ok(Platform::Facebook),
            other => Err(AppError::invalid_input(format!("Unknown platform: {}", other))),
        }
    }
}

/// Direction the background gradient runs, named by where `color2` ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientAngle {
    Vertical,
    Horizontal,
    #[default]
    DiagonalBr,
    DiagonalBl,
    DiagonalTr,
    DiagonalTl,
}

impl GradientAngle {
    /// Unit-square direction vector from the `color1` corner to the `color2` corner.
    pub fn direction(&self) -> (f32, f32) {
        match self {
            GradientAngle::Vertical => (0.0, 1.0),
            GradientAngle::Horizontal => (1.0, 0.0),
            GradientAngle::DiagonalBr => (1.0, 1.0),
            GradientAngle::DiagonalBl => (-1.0, 1.0),
            GradientAngle::DiagonalTr => (1.0, -1.0),
            GradientAngle::DiagonalTl => (-1.0, -1.0),
        }
    }
}

impl FromStr for GradientAngle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" => Ok(GradientAngle::Vertical),
            "horizontal" => Ok(GradientAngle::Horizontal),
            "diagonal-br" => Ok(GradientAngle::DiagonalBr),
            "diagonal-bl" => Ok(GradientAngle::DiagonalBl),
            "diagonal-tr" => Ok(GradientAngle::DiagonalTr),
            "diagonal-tl" => Ok(GradientAngle::DiagonalTl),
            other => Err(AppError::invalid_input(format!("Unknown gradient angle: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundKind {
    #[default]
    Gradient,
    Image,
}

impl FromStr for BackgroundKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient" | "" => Ok(BackgroundKind::Gradient),
            "image" => Ok(BackgroundKind::Image),
            other => Err(AppError::invalid_input(format!("Unknown background type: {}", other))),
        }
    }
}
