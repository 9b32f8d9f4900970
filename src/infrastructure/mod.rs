use tracing::{info, warn};

use crate::config::settings::AppConfig;

pub mod downloader;
pub mod llm;
pub mod media;
pub mod process;
pub mod storage;

/// Logs whether the external binaries are reachable. Missing tools are not
/// fatal at startup; the requests that need them fail instead.
pub fn check_tools(config: &AppConfig) {
    for bin in [&config.ytdlp_bin, &config.ffmpeg_bin] {
        match which::which(bin) {
            Ok(path) => info!("Found {} at {}", bin, path.display()),
            Err(_) => warn!("{} not found on PATH, downloads or renders will fail", bin),
        }
    }
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set, overlay text will be used as-is");
    }
}
