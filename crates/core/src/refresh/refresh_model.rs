//! Refresh job parameters and batch results.

use serde::Serialize;
use std::time::Duration;

use crate::jobs::JobCounts;

/// Default bound on a single provider call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Exchange scanned when none is given.
pub const DEFAULT_EXCHANGE: &str = "HOSE";

/// Settings for [`super::RefreshWorker`].
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub fetch_timeout: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Parameters of a staleness sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStaleParams {
    /// Upper bound on records refreshed in one run
    pub max_records: i64,
    /// Records older than this are stale
    pub max_age: chrono::Duration,
    /// Pause between two provider calls
    pub delay: Duration,
}

impl UpdateStaleParams {
    pub fn new(max_records: i64, max_age_hours: i64, delay: Duration) -> Self {
        Self {
            max_records,
            max_age: chrono::Duration::hours(max_age_hours),
            delay,
        }
    }

    /// Morning sweep: up to 100 records, 2 s apart.
    pub fn daily() -> Self {
        Self::new(100, 24, Duration::from_secs(2))
    }

    /// Trading-hours sweep: up to 20 records, 3 s apart.
    pub fn intraday() -> Self {
        Self::new(20, 24, Duration::from_secs(3))
    }
}

impl Default for UpdateStaleParams {
    fn default() -> Self {
        Self::new(50, 24, Duration::from_secs(3))
    }
}

/// Result of one symbol in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated,
    /// Provider failure, rate limit or timeout. The record stays stale.
    Skipped(String),
}

/// What a batch did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub counts: JobCounts,
    /// Set when a persistence failure stopped the batch
    pub fatal_error: Option<String>,
    /// Set when the batch stopped on cancellation
    pub cancelled: bool,
}

impl BatchReport {
    /// Whether the batch went through every symbol.
    pub fn ran_to_end(&self) -> bool {
        self.fatal_error.is_none() && !self.cancelled
    }
}
