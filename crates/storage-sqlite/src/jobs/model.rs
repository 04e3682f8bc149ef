//! Database models for job runs.

use chrono::Utc;
use diesel::prelude::*;

use vnscreen_core::jobs::{JobCounts, JobRun, JobStatus, JobType};
use vnscreen_core::utils::time_utils::{format_timestamp, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::job_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct JobRunDB {
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub stocks_processed: i32,
    pub stocks_updated: i32,
    pub stocks_failed: i32,
    pub error_message: Option<String>,
}

impl From<JobRunDB> for JobRun {
    fn from(db: JobRunDB) -> Self {
        Self {
            id: db.id,
            job_type: db.job_type.parse().unwrap_or(JobType::UpdateStale),
            // Unknown statuses read as failed so they are never finalized again
            status: db.status.parse().unwrap_or(JobStatus::Failed),
            started_at: parse_timestamp(&db.started_at).unwrap_or_else(|_| Utc::now()),
            completed_at: db.completed_at.and_then(|s| parse_timestamp(&s).ok()),
            counts: JobCounts {
                processed: db.stocks_processed,
                updated: db.stocks_updated,
                failed: db.stocks_failed,
            },
            error_message: db.error_message,
        }
    }
}

impl From<JobRun> for JobRunDB {
    fn from(domain: JobRun) -> Self {
        Self {
            id: domain.id,
            job_type: domain.job_type.as_str().to_string(),
            status: domain.status.as_str().to_string(),
            started_at: format_timestamp(domain.started_at),
            completed_at: domain.completed_at.map(format_timestamp),
            stocks_processed: domain.counts.processed,
            stocks_updated: domain.counts.updated,
            stocks_failed: domain.counts.failed,
            error_message: domain.error_message,
        }
    }
}
