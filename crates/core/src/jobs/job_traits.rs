//! Persistence contract for job runs.

use async_trait::async_trait;

use super::job_model::JobRun;
use crate::errors::Result;

/// Append-only storage of job runs.
#[async_trait]
pub trait JobRunRepositoryTrait: Send + Sync {
    async fn create(&self, run: JobRun) -> Result<JobRun>;

    /// Persist the terminal state of a run.
    async fn update(&self, run: JobRun) -> Result<JobRun>;

    fn get_by_id(&self, id: &str) -> Result<Option<JobRun>>;

    /// Latest runs, newest first.
    fn get_recent(&self, limit: i64) -> Result<Vec<JobRun>>;
}
