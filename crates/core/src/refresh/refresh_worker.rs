//! Sequential, paced refresh of screening records.

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vnscreen_market_data::{normalize_exchange, MarketDataProvider};

use super::refresh_model::{BatchReport, RefreshOutcome, RefreshSettings, UpdateStaleParams};
use crate::errors::Result;
use crate::jobs::{JobLedger, JobOutcome, JobRun, JobType};
use crate::screening::Datastore;

/// Fetches fresh data for symbols one at a time and stores it.
///
/// Provider calls are never issued concurrently from one batch: the pause
/// between calls is the only throttle on the upstream.
pub struct RefreshWorker {
    provider: Arc<dyn MarketDataProvider>,
    datastore: Arc<dyn Datastore>,
    ledger: JobLedger,
    settings: RefreshSettings,
}

impl RefreshWorker {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        datastore: Arc<dyn Datastore>,
        ledger: JobLedger,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            provider,
            datastore,
            ledger,
            settings,
        }
    }

    pub fn ledger(&self) -> &JobLedger {
        &self.ledger
    }

    /// Refresh a single symbol.
    ///
    /// Provider errors and timeouts are reported as [`RefreshOutcome::Skipped`].
    /// Errors from the datastore are returned; [`crate::Error::is_job_fatal`]
    /// decides whether they stop the batch.
    pub async fn refresh_one(&self, symbol: &str) -> Result<RefreshOutcome> {
        let fetched =
            tokio::time::timeout(self.settings.fetch_timeout, self.provider.fetch(symbol)).await;

        let mut snapshot = match fetched {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                if e.is_rate_limited() {
                    warn!("Provider rate limited while fetching {}: {}", symbol, e);
                } else if e.is_timeout() {
                    warn!("Provider timed out while fetching {}: {}", symbol, e);
                } else {
                    warn!("Failed to fetch {}: {}", symbol, e);
                }
                return Ok(RefreshOutcome::Skipped(e.to_string()));
            }
            Err(_) => {
                warn!(
                    "Fetching {} timed out after {:?}",
                    symbol, self.settings.fetch_timeout
                );
                return Ok(RefreshOutcome::Skipped(format!(
                    "timed out after {:?}",
                    self.settings.fetch_timeout
                )));
            }
        };

        if snapshot.symbol.trim().is_empty() {
            snapshot.symbol = symbol.to_string();
        }
        self.datastore.upsert(snapshot).await?;
        debug!("Refreshed {}", symbol);
        Ok(RefreshOutcome::Updated)
    }

    /// Refresh `symbols` in order, pausing `delay` between calls.
    ///
    /// Cancellation is checked before each symbol and also cuts the pause short.
    /// A job-fatal error stops the batch; upserts already made are kept. Other
    /// errors count as a failed symbol.
    pub async fn run_batch(
        &self,
        symbols: &[String],
        delay: Duration,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for (i, symbol) in symbols.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Batch cancelled after {} of {} symbols", i, symbols.len());
                report.cancelled = true;
                break;
            }

            report.counts.processed += 1;
            match self.refresh_one(symbol).await {
                Ok(RefreshOutcome::Updated) => report.counts.updated += 1,
                Ok(RefreshOutcome::Skipped(_)) => report.counts.failed += 1,
                Err(e) if !e.is_job_fatal() => {
                    warn!("Skipping {}: {}", symbol, e);
                    report.counts.failed += 1;
                }
                Err(e) => {
                    error!("Stopping batch, could not store {}: {}", symbol, e);
                    report.counts.failed += 1;
                    report.fatal_error = Some(e.to_string());
                    break;
                }
            }

            let is_last = i + 1 == symbols.len();
            if !is_last && !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Batch cancelled after {} of {} symbols", i + 1, symbols.len());
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        report
    }

    /// Refresh the stalest records as one job run.
    pub async fn update_stale(
        &self,
        job_type: JobType,
        params: UpdateStaleParams,
        cancel: CancellationToken,
    ) -> Result<JobRun> {
        let run = self.ledger.start(job_type).await?;

        let stale = match self
            .datastore
            .query_stale(params.max_age, params.max_records)
        {
            Ok(records) => records,
            Err(e) => return self.fail_before_batch(&run, e.to_string()).await,
        };

        if stale.is_empty() {
            info!("No stale records to refresh");
        } else {
            info!("Refreshing {} stale records", stale.len());
        }

        let symbols: Vec<String> = stale.into_iter().map(|r| r.symbol).collect();
        let report = self.run_batch(&symbols, params.delay, &cancel).await;
        self.finish(&run, report).await
    }

    /// Refresh every symbol listed on `exchange` as one job run.
    pub async fn full_scan(
        &self,
        exchange: &str,
        delay: Duration,
        cancel: CancellationToken,
    ) -> Result<JobRun> {
        let exchange = normalize_exchange(exchange);
        let run = self.ledger.start(JobType::FullScan).await?;

        let listings = match self.provider.list_symbols(&exchange).await {
            Ok(listings) => listings,
            Err(e) => {
                let message = format!("Could not list symbols for {}: {}", exchange, e);
                return self.fail_before_batch(&run, message).await;
            }
        };

        info!("Full scan of {}: {} symbols", exchange, listings.len());
        let symbols: Vec<String> = listings.into_iter().map(|l| l.symbol).collect();
        let report = self.run_batch(&symbols, delay, &cancel).await;
        self.finish(&run, report).await
    }

    async fn finish(&self, run: &JobRun, report: BatchReport) -> Result<JobRun> {
        let outcome = if let Some(error) = report.fatal_error {
            JobOutcome::Failed {
                counts: report.counts,
                error,
            }
        } else if report.cancelled {
            JobOutcome::Failed {
                counts: report.counts,
                error: "Cancelled".to_string(),
            }
        } else {
            JobOutcome::Completed(report.counts)
        };
        self.ledger.finish(&run.id, outcome).await
    }

    async fn fail_before_batch(&self, run: &JobRun, error: String) -> Result<JobRun> {
        self.ledger
            .finish(
                &run.id,
                JobOutcome::Failed {
                    counts: Default::default(),
                    error,
                },
            )
            .await
    }
}
