//! Job run domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Kind of background job a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Every symbol listed on an exchange
    FullScan,
    /// Manually triggered staleness sweep
    UpdateStale,
    DailyUpdate,
    IntradayUpdate,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullScan => "full_scan",
            JobType::UpdateStale => "update_stale",
            JobType::DailyUpdate => "daily_update",
            JobType::IntradayUpdate => "intraday_update",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_scan" => Ok(JobType::FullScan),
            "update_stale" => Ok(JobType::UpdateStale),
            "daily_update" => Ok(JobType::DailyUpdate),
            "intraday_update" => Ok(JobType::IntradayUpdate),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown job type '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle of a run: `Running`, then exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown job status '{}'",
                other
            ))),
        }
    }
}

/// Per-symbol tallies of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    pub processed: i32,
    pub updated: i32,
    pub failed: i32,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(JobCounts),
    Failed { counts: JobCounts, error: String },
}

/// One execution of a background job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    /// Set only when the run reaches a terminal status
    pub completed_at: Option<DateTime<Utc>>,
    pub counts: JobCounts,
    pub error_message: Option<String>,
}

impl JobRun {
    pub fn new(job_type: JobType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type,
            status: JobStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            counts: JobCounts::default(),
            error_message: None,
        }
    }

    /// Move the run to its terminal status.
    pub fn finish(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Completed(counts) => {
                self.status = JobStatus::Completed;
                self.counts = counts;
            }
            JobOutcome::Failed { counts, error } => {
                self.status = JobStatus::Failed;
                self.counts = counts;
                self.error_message = Some(error);
            }
        }
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock duration of a finished run.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}
