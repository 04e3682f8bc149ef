//! Fires refresh jobs on fixed triggers and on request.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::cron::CronTrigger;
use super::refresh_model::UpdateStaleParams;
use super::refresh_worker::RefreshWorker;
use crate::errors::{Error, Result};
use crate::jobs::JobType;

/// Market timezone used to evaluate triggers.
pub const DEFAULT_MARKET_TZ: Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// A recurring staleness sweep.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub id: String,
    pub name: String,
    pub job_type: JobType,
    pub trigger: CronTrigger,
    pub params: UpdateStaleParams,
}

impl ScheduledJob {
    /// 07:00 every day, before the market opens.
    pub fn daily_update() -> Self {
        Self {
            id: JobType::DailyUpdate.as_str().to_string(),
            name: "Daily stock data update".to_string(),
            job_type: JobType::DailyUpdate,
            trigger: CronTrigger::daily(7, 0),
            params: UpdateStaleParams::daily(),
        }
    }

    /// Half past every other hour of the trading day.
    pub fn intraday_update() -> Self {
        Self {
            id: JobType::IntradayUpdate.as_str().to_string(),
            name: "Intraday stock data update".to_string(),
            job_type: JobType::IntradayUpdate,
            trigger: CronTrigger::stepped(9, 15, 2, 30),
            params: UpdateStaleParams::intraday(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJobStatus {
    pub id: String,
    pub name: String,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub in_flight: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub timezone: String,
    pub jobs: Vec<ScheduledJobStatus>,
}

/// Marks a scheduled job as running until dropped.
struct InFlightGuard {
    job_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    /// Returns `None` if the job is already running.
    fn try_acquire(in_flight: &Arc<Mutex<HashSet<String>>>, job_id: &str) -> Option<Self> {
        let mut running = lock_set(in_flight);
        if !running.insert(job_id.to_string()) {
            return None;
        }
        Some(Self {
            job_id: job_id.to_string(),
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock_set(&self.in_flight).remove(&self.job_id);
    }
}

fn lock_set(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|poisoned| {
        warn!("Scheduler in-flight mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Runs [`ScheduledJob`]s on their triggers and manual jobs on request.
///
/// A scheduled job never overlaps itself: a trigger that fires while the
/// previous run is still going is skipped. Manual jobs are independent.
pub struct RefreshScheduler {
    worker: Arc<RefreshWorker>,
    jobs: Vec<ScheduledJob>,
    timezone: Tz,
    shutdown: CancellationToken,
    running: AtomicBool,
    in_flight: Arc<Mutex<HashSet<String>>>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(worker: Arc<RefreshWorker>, jobs: Vec<ScheduledJob>, timezone: Tz) -> Self {
        Self {
            worker,
            jobs,
            timezone,
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            loops: Mutex::new(Vec::new()),
        }
    }

    /// Scheduler with the daily and intraday sweeps.
    pub fn with_default_jobs(worker: Arc<RefreshWorker>, timezone: Tz) -> Self {
        Self::new(
            worker,
            vec![ScheduledJob::daily_update(), ScheduledJob::intraday_update()],
            timezone,
        )
    }

    pub fn worker(&self) -> &Arc<RefreshWorker> {
        &self.worker
    }

    /// Spawn one trigger loop per scheduled job. Calling it again is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.shutdown.is_cancelled() {
            warn!("Refresh scheduler was stopped and cannot be restarted");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut loops = self.lock_loops();
        for job in &self.jobs {
            let scheduler = Arc::clone(self);
            let job_id = job.id.clone();
            loops.push(tokio::spawn(async move {
                scheduler.trigger_loop(job_id).await;
            }));
        }
        info!(
            "Refresh scheduler started with {} jobs ({})",
            self.jobs.len(),
            self.timezone
        );
    }

    /// Stop the trigger loops and cancel every running batch.
    pub fn stop(&self) {
        self.shutdown.cancel();
        self.running.store(false, Ordering::SeqCst);
        for handle in self.lock_loops().drain(..) {
            handle.abort();
        }
        info!("Refresh scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SchedulerStatus {
        let now = Utc::now();
        let in_flight = lock_set(&self.in_flight).clone();
        let running = self.is_running();

        SchedulerStatus {
            running,
            timezone: self.timezone.name().to_string(),
            jobs: self
                .jobs
                .iter()
                .map(|job| ScheduledJobStatus {
                    id: job.id.clone(),
                    name: job.name.clone(),
                    next_fire_time: if running {
                        job.trigger.next_fire_after(now, self.timezone)
                    } else {
                        None
                    },
                    in_flight: in_flight.contains(&job.id),
                })
                .collect(),
        }
    }

    /// Run a scheduled job now, unless it is already running.
    ///
    /// Returns `Ok(None)` when the run was skipped.
    pub fn fire(&self, job_id: &str) -> Result<Option<JoinHandle<()>>> {
        let job = self
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("scheduled job {}", job_id)))?;

        let Some(guard) = InFlightGuard::try_acquire(&self.in_flight, &job.id) else {
            warn!("Skipping {}: previous run is still in progress", job.id);
            return Ok(None);
        };

        let worker = Arc::clone(&self.worker);
        let cancel = self.shutdown.child_token();
        Ok(Some(tokio::spawn(async move {
            let _guard = guard;
            info!("Running scheduled job {}", job.name);
            if let Err(e) = worker.update_stale(job.job_type, job.params, cancel).await {
                error!("Scheduled job {} could not be recorded: {}", job.id, e);
            }
        })))
    }

    /// Refresh every symbol of an exchange in the background.
    ///
    /// Refused once the scheduler has been stopped.
    pub fn trigger_full_scan(&self, exchange: &str, delay: Duration) -> Result<JoinHandle<()>> {
        let cancel = self.manual_token()?;
        let worker = Arc::clone(&self.worker);
        let exchange = exchange.to_string();
        info!("Manual full scan of {} requested", exchange);
        Ok(tokio::spawn(async move {
            if let Err(e) = worker.full_scan(&exchange, delay, cancel).await {
                error!("Full scan of {} could not be recorded: {}", exchange, e);
            }
        }))
    }

    /// Refresh the stalest records in the background.
    pub fn trigger_update_stale(
        &self,
        max_records: i64,
        max_age_hours: i64,
        delay: Duration,
    ) -> Result<JoinHandle<()>> {
        let cancel = self.manual_token()?;
        let worker = Arc::clone(&self.worker);
        let params = UpdateStaleParams::new(max_records, max_age_hours, delay);
        info!(
            "Manual stale update requested: max {} records older than {}h",
            max_records, max_age_hours
        );
        Ok(tokio::spawn(async move {
            if let Err(e) = worker
                .update_stale(JobType::UpdateStale, params, cancel)
                .await
            {
                error!("Stale update could not be recorded: {}", e);
            }
        }))
    }

    fn manual_token(&self) -> Result<CancellationToken> {
        if self.shutdown.is_cancelled() {
            warn!("Refusing manual run: scheduler is stopped");
            return Err(Error::SchedulerStopped);
        }
        Ok(self.shutdown.child_token())
    }

    async fn trigger_loop(&self, job_id: String) {
        let Some(trigger) = self
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .map(|j| j.trigger.clone())
        else {
            return;
        };

        loop {
            let now = Utc::now();
            let Some(next) = trigger.next_fire_after(now, self.timezone) else {
                warn!("Scheduled job {} has no upcoming fire time", job_id);
                return;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }

            if let Err(e) = self.fire(&job_id) {
                error!("Failed to fire scheduled job {}: {}", job_id, e);
            }
        }
    }

    fn lock_loops(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.loops.lock().unwrap_or_else(|poisoned| {
            warn!("Scheduler loop mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
