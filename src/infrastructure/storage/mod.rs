pub mod cleanup;
pub mod job_store;

pub use cleanup::CleanupGuard;
pub use job_store::{JobFiles, JobId, JobStore};
