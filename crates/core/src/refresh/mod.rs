//! Refresh module - staleness-driven refresh jobs and their scheduler.

mod cron;
mod refresh_model;
mod refresh_worker;
mod scheduler;


pub use cron::CronTrigger;
pub use refresh_model::{
    BatchReport, RefreshOutcome, RefreshSettings, UpdateStaleParams, DEFAULT_EXCHANGE,
    DEFAULT_FETCH_TIMEOUT,
};
pub use refresh_worker::RefreshWorker;
pub use scheduler::{
    RefreshScheduler, ScheduledJob, ScheduledJobStatus, SchedulerStatus, DEFAULT_MARKET_TZ,
};
