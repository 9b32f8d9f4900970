use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DownloadDir,
    GroqApiKey,
    GroqModel,
    GroqApiUrl,
    DefaultColor1,
    DefaultColor2,
    DefaultPlatform,
    TemplateWidth,
    TemplateHeight,
    YtDlpBin,
    FfmpegBin,
    FontFile,
    MaxUploadBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DownloadDir => "DOWNLOAD_DIR",
            EnvKey::GroqApiKey => "GROQ_API_KEY",
            EnvKey::GroqModel => "GROQ_MODEL",
            EnvKey::GroqApiUrl => "GROQ_API_URL",
            EnvKey::DefaultColor1 => "DEFAULT_COLOR1",
            EnvKey::DefaultColor2 => "DEFAULT_COLOR2",
            EnvKey::DefaultPlatform => "DEFAULT_PLATFORM",
            EnvKey::TemplateWidth => "TEMPLATE_WIDTH",
            EnvKey::TemplateHeight => "TEMPLATE_HEIGHT",
            EnvKey::YtDlpBin => "YTDLP_BIN",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
            EnvKey::FontFile => "FONT_FILE",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

/// Like [`get`], but treats an unset or blank variable as absent.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str())
        .ok()
        .filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    get_opt(key).unwrap_or_else(|| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
