//! Lifecycle log of background job runs.

use log::{error, info};
use std::sync::Arc;

use super::job_model::{JobOutcome, JobRun, JobStatus, JobType};
use super::job_traits::JobRunRepositoryTrait;
use crate::errors::{Error, Result};

/// Records job runs: one `start`, then exactly one `finish`.
#[derive(Clone)]
pub struct JobLedger {
    repository: Arc<dyn JobRunRepositoryTrait>,
}

impl JobLedger {
    pub fn new(repository: Arc<dyn JobRunRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Open a new run in the `running` state.
    pub async fn start(&self, job_type: JobType) -> Result<JobRun> {
        let run = self.repository.create(JobRun::new(job_type)).await?;
        info!("Job {} started ({})", run.job_type, run.id);
        Ok(run)
    }

    /// Finalize a running run. A run that already finished is left untouched.
    pub async fn finish(&self, job_id: &str, outcome: JobOutcome) -> Result<JobRun> {
        let mut run = self
            .repository
            .get_by_id(job_id)?
            .ok_or_else(|| Error::NotFound(format!("job run {}", job_id)))?;

        if run.status.is_terminal() {
            return Err(Error::JobAlreadyFinished(job_id.to_string()));
        }

        run.finish(outcome);
        let run = self.repository.update(run).await?;

        match run.status {
            JobStatus::Failed => error!(
                "Job {} failed after {} symbols: {}",
                run.job_type,
                run.counts.processed,
                run.error_message.as_deref().unwrap_or("unknown error")
            ),
            _ => info!(
                "Job {} completed: {} processed, {} updated, {} failed",
                run.job_type, run.counts.processed, run.counts.updated, run.counts.failed
            ),
        }
        Ok(run)
    }

    /// Latest runs, newest first.
    pub fn recent(&self, limit: i64) -> Result<Vec<JobRun>> {
        self.repository.get_recent(limit)
    }

    pub fn get(&self, job_id: &str) -> Result<Option<JobRun>> {
        self.repository.get_by_id(job_id)
    }
}
