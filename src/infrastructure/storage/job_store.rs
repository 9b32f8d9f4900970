use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::cleanup::CleanupGuard;
use crate::common::error::{AppError, AppResult};

/// Token that namespaces every file belonging to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Client-supplied ids must be UUIDs; they end up in file names.
    pub fn parse(raw: &str) -> AppResult<Self> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| AppError::invalid_input("Invalid video_id"))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// What a prepared job still needs at render time. Entries live from
/// download until the job is rendered or fails.
#[derive(Debug, Clone, Default)]
pub struct JobFiles {
    pub raw: Option<PathBuf>,
    pub title: Option<String>,
}

/// Flat download directory plus an index of which job owns which file.
///
/// The directory is authoritative: index entries are checked against disk
/// before use, and a miss falls back to one prefix scan whose result is
/// recorded.
#[derive(Clone)]
pub struct JobStore {
    root: Arc<PathBuf>,
    index: Arc<RwLock<HashMap<JobId, JobFiles>>>,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.as_path()).await?;
        info!("Storage directory ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn raw_prefix(id: JobId) -> String {
        format!("{}_raw", id)
    }

    /// Path without extension; the downloader picks the extension.
    pub fn raw_stem(&self, id: JobId) -> PathBuf {
        self.root.join(Self::raw_prefix(id))
    }

    pub fn preview_name(id: JobId) -> String {
        format!("{}_preview.jpg", id)
    }

    pub fn preview_path(&self, id: JobId) -> PathBuf {
        self.root.join(Self::preview_name(id))
    }

    pub fn output_name(id: JobId) -> String {
        format!("{}.mp4", id)
    }

    pub fn output_path(&self, id: JobId) -> PathBuf {
        self.root.join(Self::output_name(id))
    }

    /// Stem for render-time scratch files such as `{id}_bg.png`.
    pub fn scratch_stem(&self, id: JobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    pub fn background_name(ext: &str) -> String {
        format!("bg_{}.{}", Uuid::new_v4(), ext)
    }

    /// Maps a client-supplied bare file name into the storage directory.
    /// Separators and parent references are refused before any disk access.
    pub fn resolve_name(&self, name: &str) -> AppResult<PathBuf> {
        if !is_plain_file_name(name) {
            return Err(AppError::invalid_input("Invalid filename"));
        }
        Ok(self.root.join(name))
    }

    pub fn guard(&self, id: JobId) -> CleanupGuard {
        CleanupGuard::for_job(self.clone(), id)
    }

    pub fn files(&self, id: JobId) -> JobFiles {
        self.index.read().get(&id).cloned().unwrap_or_default()
    }

    pub fn title(&self, id: JobId) -> Option<String> {
        self.index.read().get(&id).and_then(|f| f.title.clone())
    }

    pub fn record_raw(&self, id: JobId, path: PathBuf, title: Option<String>) {
        let mut index = self.index.write();
        let entry = index.entry(id).or_default();
        entry.raw = Some(path);
        if title.is_some() {
            entry.title = title;
        }
    }

    pub fn forget(&self, id: JobId) {
        self.index.write().remove(&id);
    }

    pub fn tracked_jobs(&self) -> usize {
        self.index.read().len()
    }

    /// Finds the raw download of a job.
    ///
    /// Order: indexed path, `{id}_raw.{ext}` when the downloader reported an
    /// extension, then a scan for the `{id}_raw` prefix.
    pub async fn locate_raw(&self, id: JobId, reported_ext: Option<&str>) -> AppResult<Option<PathBuf>> {
        let indexed = self.index.read().get(&id).and_then(|f| f.raw.clone());
        if let Some(path) = indexed {
            if tokio::fs::try_exists(&path).await? {
                return Ok(Some(path));
            }
            debug!("Indexed raw file for job {} vanished, rescanning", id);
        }

        if let Some(ext) = reported_ext.filter(|e| !e.is_empty()) {
            let mut expected = self.raw_stem(id).into_os_string();
            expected.push(".");
            expected.push(ext);
            let expected = PathBuf::from(expected);
            if tokio::fs::try_exists(&expected).await? {
                self.record_raw(id, expected.clone(), None);
                return Ok(Some(expected));
            }
        }

        let found = self.find_by_prefix(&Self::raw_prefix(id)).await?;
        if let Some(path) = &found {
            debug!("Resolved raw file for job {} by scan: {}", id, path.display());
            self.record_raw(id, path.clone(), None);
        }
        Ok(found)
    }

    /// First completed file whose name starts with `prefix`.
    pub async fn find_by_prefix(&self, prefix: &str) -> std::io::Result<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(self.root.as_path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(prefix) && !is_partial_download(&name) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }
}

pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

fn is_partial_download(name: &str) -> bool {
    name.ends_with(".part") || name.ends_with(".ytdl") || name.contains(".part-Frag")
}
