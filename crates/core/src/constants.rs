/// Records older than this many hours are stale unless a job says otherwise.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Job runs returned by the ledger when no limit is given.
pub const DEFAULT_RECENT_JOBS_LIMIT: i64 = 20;

/// Bounds accepted for manually triggered jobs.
pub const MAX_MANUAL_RECORDS: i64 = 200;
pub const MAX_MANUAL_AGE_HOURS: i64 = 168;
pub const MIN_MANUAL_DELAY_SECS: u64 = 1;
pub const MAX_MANUAL_DELAY_SECS: u64 = 10;
