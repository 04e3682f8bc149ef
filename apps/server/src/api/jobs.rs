use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vnscreen_core::{
    constants::{
        DEFAULT_MAX_AGE_HOURS, DEFAULT_RECENT_JOBS_LIMIT, MAX_MANUAL_AGE_HOURS,
        MAX_MANUAL_DELAY_SECS, MAX_MANUAL_RECORDS, MIN_MANUAL_DELAY_SECS,
    },
    errors::{Error as CoreError, ValidationError},
    jobs::{JobRun, JobType},
    refresh::{SchedulerStatus, UpdateStaleParams, DEFAULT_EXCHANGE},
    screening::FreshnessStats,
};

use crate::{error::ApiResult, main_lib::AppState};

/// Job runs shown alongside the database stats.
const STATS_RECENT_JOBS: i64 = 5;

#[derive(Deserialize)]
struct FullScanQuery {
    exchange: Option<String>,
    delay_seconds: Option<u64>,
}

#[derive(Deserialize)]
struct UpdateStaleQuery {
    max_stocks: Option<i64>,
    max_age_hours: Option<i64>,
    delay_seconds: Option<u64>,
}

#[derive(Deserialize)]
struct RecentJobsQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobAccepted {
    job_type: JobType,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseStats {
    #[serde(flatten)]
    freshness: FreshnessStats,
    fresh_percentage: f64,
    max_age_hours: i64,
    recent_jobs: Vec<JobRun>,
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<T, CoreError> {
    if value < min || value > max {
        return Err(ValidationError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        ))
        .into());
    }
    Ok(value)
}

fn delay_from(query: Option<u64>) -> Result<Duration, CoreError> {
    let secs = check_range(
        "delay_seconds",
        query.unwrap_or(UpdateStaleParams::default().delay.as_secs()),
        MIN_MANUAL_DELAY_SECS,
        MAX_MANUAL_DELAY_SECS,
    )?;
    Ok(Duration::from_secs(secs))
}

async fn get_scheduler_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

async fn trigger_full_scan(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FullScanQuery>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let exchange = query
        .exchange
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string());
    let delay = delay_from(query.delay_seconds)?;

    state.scheduler.trigger_full_scan(&exchange, delay)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_type: JobType::FullScan,
            message: format!(
                "Full scan of {} started with {}s between symbols",
                exchange,
                delay.as_secs()
            ),
        }),
    ))
}

async fn trigger_update_stale(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpdateStaleQuery>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let defaults = UpdateStaleParams::default();
    let max_records = check_range(
        "max_stocks",
        query.max_stocks.unwrap_or(defaults.max_records),
        1,
        MAX_MANUAL_RECORDS,
    )?;
    let max_age_hours = check_range(
        "max_age_hours",
        query.max_age_hours.unwrap_or(DEFAULT_MAX_AGE_HOURS),
        1,
        MAX_MANUAL_AGE_HOURS,
    )?;
    let delay = delay_from(query.delay_seconds)?;

    state
        .scheduler
        .trigger_update_stale(max_records, max_age_hours, delay)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_type: JobType::UpdateStale,
            message: format!(
                "Updating up to {} records older than {}h",
                max_records, max_age_hours
            ),
        }),
    ))
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentJobsQuery>,
) -> ApiResult<Json<Vec<JobRun>>> {
    let limit = check_range(
        "limit",
        query.limit.unwrap_or(DEFAULT_RECENT_JOBS_LIMIT),
        1,
        MAX_MANUAL_RECORDS,
    )?;
    Ok(Json(state.ledger.recent(limit)?))
}

async fn get_job(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<JobRun>> {
    let job = state
        .ledger
        .get(&id)?
        .ok_or_else(|| CoreError::NotFound(format!("Job run {}", id)))?;
    Ok(Json(job))
}

async fn get_database_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DatabaseStats>> {
    let freshness = state
        .datastore
        .freshness_stats(chrono::Duration::hours(DEFAULT_MAX_AGE_HOURS))?;
    let recent_jobs = state.ledger.recent(STATS_RECENT_JOBS)?;
    Ok(Json(DatabaseStats {
        fresh_percentage: freshness.fresh_percentage(),
        freshness,
        max_age_hours: DEFAULT_MAX_AGE_HOURS,
        recent_jobs,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scheduler/status", get(get_scheduler_status))
        .route("/jobs", get(list_jobs))
        .route("/jobs/full-scan", post(trigger_full_scan))
        .route("/jobs/update-stale", post(trigger_update_stale))
        .route("/jobs/{id}", get(get_job))
        .route("/database/stats", get(get_database_stats))
}
