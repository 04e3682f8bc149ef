//! Jobs module - job run records and the ledger that tracks their lifecycle.

mod job_ledger;
mod job_model;
mod job_traits;

pub use job_ledger::JobLedger;
pub use job_model::{JobCounts, JobOutcome, JobRun, JobStatus, JobType};
pub use job_traits::JobRunRepositoryTrait;
