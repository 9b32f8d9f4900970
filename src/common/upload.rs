use std::path::{Path, PathBuf};

use axum::{body::Bytes, extract::multipart::Field};
use futures_util::StreamExt;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{error, info};

use super::error::{AppError, AppResult};
use crate::infrastructure::storage::CleanupGuard;

const DEFAULT_EXT: &str = "png";

/// Extension taken from the client's file name, if it looks like one.
pub fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXT.to_string())
}

/// Writes a multipart stream to a local file. The file is removed unless
/// `finish` succeeds.
pub struct DiskUploader {
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
    guard: CleanupGuard,
}

impl DiskUploader {
    pub async fn new(path: &Path) -> AppResult<Self> {
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let mut guard = CleanupGuard::scratch(root);
        guard.track(path);

        let file = File::create(path).await?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
            guard,
        })
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> AppResult<()> {
        self.writer.write_all(&chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> AppResult<u64> {
        self.writer.flush().await?;
        self.guard.commit();
        info!("Stored upload {} ({} bytes)", self.path.display(), self.written);
        Ok(self.written)
    }
}

/// Streams an image field to `path`.
pub async fn stream_to_disk(mut field: Field<'_>, path: &Path) -> AppResult<u64> {
    let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();

    if !content_type.starts_with("image/") {
        return Err(AppError::invalid_input(format!(
            "Invalid content type {}: only image/* allowed",
            content_type
        )));
    }

    let mut uploader = DiskUploader::new(path).await?;

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| {
            error!("Upload stream error: {}", e);
            AppError::invalid_input(format!("Upload interrupted: {}", e.body_text()))
        })?;
        uploader.write_chunk(chunk).await?;
    }

    uploader.finish().await
}
