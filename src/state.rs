use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::downloader::{VideoDownloader, YtDlp};
use crate::infrastructure::llm::{GroqFormatter, TextFormatter};
use crate::infrastructure::media::{FfmpegCompositor, FfmpegPreview, PreviewExtractor, TemplateCompositor};
use crate::infrastructure::storage::JobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: JobStore,
    pub downloader: Arc<dyn VideoDownloader>,
    pub preview: Arc<dyn PreviewExtractor>,
    pub formatter: Arc<dyn TextFormatter>,
    pub compositor: Arc<dyn TemplateCompositor>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        downloader: Arc<dyn VideoDownloader>,
        preview: Arc<dyn PreviewExtractor>,
        formatter: Arc<dyn TextFormatter>,
        compositor: Arc<dyn TemplateCompositor>,
    ) -> Self {
        let store = JobStore::new(config.download_dir.clone());
        Self {
            config: Arc::new(config),
            store,
            downloader,
            preview,
            formatter,
            compositor,
        }
    }

    /// State wired to the real external tools.
    pub fn from_config(config: AppConfig) -> Self {
        let downloader = Arc::new(YtDlp::new(&config));
        let preview = Arc::new(FfmpegPreview::new(&config));
        let formatter = Arc::new(GroqFormatter::new(&config));
        let compositor = Arc::new(FfmpegCompositor::new(&config));
        Self::new(config, downloader, preview, formatter, compositor)
    }
}
