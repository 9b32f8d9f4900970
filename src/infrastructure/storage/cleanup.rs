use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::job_store::{JobId, JobStore};

/// Scoped ownership of files created while a flow runs.
///
/// Files and name prefixes are registered as they are produced. Dropping the
/// guard without [`CleanupGuard::commit`] deletes everything registered and,
/// for job guards, drops the job from the index. Removal errors are ignored:
/// the file may never have been written.
pub struct CleanupGuard {
    root: PathBuf,
    job: Option<(JobStore, JobId)>,
    files: Vec<PathBuf>,
    prefixes: Vec<String>,
    armed: bool,
}

impl CleanupGuard {
    pub(super) fn for_job(store: JobStore, id: JobId) -> Self {
        Self {
            root: store.root().to_path_buf(),
            job: Some((store, id)),
            files: Vec::new(),
            prefixes: Vec::new(),
            armed: true,
        }
    }

    /// Guard for files that never outlive the current scope, success or not.
    pub fn scratch(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            job: None,
            files: Vec::new(),
            prefixes: Vec::new(),
            armed: true,
        }
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    /// Registers every file in the root whose name starts with `prefix`,
    /// including ones a tool creates later under names we cannot predict.
    pub fn track_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    /// Keeps the registered files.
    pub fn commit(mut self) {
        self.armed = false;
    }

    fn remove_file(path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Cleaned up {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clean up {}: {}", path.display(), e),
        }
    }

    fn sweep_prefixes(&self) {
        if self.prefixes.is_empty() {
            return;
        }
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if self.prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                Self::remove_file(&entry.path());
            }
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in &self.files {
            Self::remove_file(path);
        }
        self.sweep_prefixes();
        if let Some((store, id)) = &self.job {
            store.forget(*id);
        }
    }
}
