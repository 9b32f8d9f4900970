use std::fmt;
use std::path::PathBuf;

use crate::config::env::{self, EnvKey};

/// Immutable runtime configuration, built once at startup and shared through
/// [`crate::state::AppState`].
#[derive(Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub download_dir: PathBuf,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_api_url: String,
    pub default_color1: String,
    pub default_color2: String,
    pub default_platform: String,
    pub template_width: u32,
    pub template_height: u32,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    /// drawtext font file; fontconfig `Sans` when unset.
    pub font_file: Option<String>,
    pub max_upload_bytes: usize,
}

pub const DEFAULT_COLOR1: &str = "#001534";
pub const DEFAULT_COLOR2: &str = "#6409a4";
pub const DEFAULT_PLATFORM: &str = "instagram";
pub const TEMPLATE_WIDTH: u32 = 1080;
pub const TEMPLATE_HEIGHT: u32 = 1920;

fn default_download_dir() -> PathBuf {
    // /tmp is tmpfs on most Linux hosts
    if cfg!(target_os = "linux") {
        PathBuf::from("/tmp/downloads")
    } else {
        PathBuf::from("downloads")
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            download_dir: env::get_opt(EnvKey::DownloadDir)
                .map(PathBuf::from)
                .unwrap_or_else(default_download_dir),
            groq_api_key: env::get_opt(EnvKey::GroqApiKey),
            groq_model: env::get_or(EnvKey::GroqModel, "llama-3.3-70b-versatile"),
            groq_api_url: env::get_or(EnvKey::GroqApiUrl, "https://api.groq.com/openai/v1"),
            default_color1: env::get_or(EnvKey::DefaultColor1, DEFAULT_COLOR1),
            default_color2: env::get_or(EnvKey::DefaultColor2, DEFAULT_COLOR2),
            default_platform: env::get_or(EnvKey::DefaultPlatform, DEFAULT_PLATFORM),
            template_width: env::get_parsed(EnvKey::TemplateWidth, TEMPLATE_WIDTH),
            template_height: env::get_parsed(EnvKey::TemplateHeight, TEMPLATE_HEIGHT),
            ytdlp_bin: env::get_or(EnvKey::YtDlpBin, "yt-dlp"),
            ffmpeg_bin: env::get_or(EnvKey::FfmpegBin, "ffmpeg"),
            font_file: env::get_opt(EnvKey::FontFile),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, 20 * 1024 * 1024),
        }
    }

    /// Defaults with every artifact placed under `download_dir`.
    pub fn with_download_dir(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_port: 3000,
            download_dir: download_dir.into(),
            groq_api_key: None,
            groq_model: "llama-3.3-70b-versatile".to_string(),
            groq_api_url: "https://api.groq.com/openai/v1".to_string(),
            default_color1: DEFAULT_COLOR1.to_string(),
            default_color2: DEFAULT_COLOR2.to_string(),
            default_platform: DEFAULT_PLATFORM.to_string(),
            template_width: TEMPLATE_WIDTH,
            template_height: TEMPLATE_HEIGHT,
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            font_file: None,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_download_dir(default_download_dir())
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("server_port", &self.server_port)
            .field("download_dir", &self.download_dir)
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<redacted>"))
            .field("groq_model", &self.groq_model)
            .field("default_platform", &self.default_platform)
            .field("template_width", &self.template_width)
            .field("template_height", &self.template_height)
            .field("ytdlp_bin", &self.ytdlp_bin)
            .field("ffmpeg_bin", &self.ffmpeg_bin)
            .field("font_file", &self.font_file)
            .finish()
    }
}
