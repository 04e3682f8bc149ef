//! In-memory collaborators shared by the unit tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use vnscreen_market_data::{ListedSymbol, MarketDataError, MarketDataProvider, ScreeningSnapshot};

use crate::errors::{DatabaseError, Error, Result, ValidationError};
use crate::jobs::{JobRun, JobRunRepositoryTrait};
use crate::screening::{Datastore, FreshnessStats, ScreeningRecord};

// =========================================================================
// Job runs
// =========================================================================

#[derive(Default)]
pub struct InMemoryJobRuns {
    runs: Mutex<Vec<JobRun>>,
}

#[async_trait]
impl JobRunRepositoryTrait for InMemoryJobRuns {
    async fn create(&self, run: JobRun) -> Result<JobRun> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(run)
    }

    async fn update(&self, run: JobRun) -> Result<JobRun> {
        let mut runs = self.runs.lock().unwrap();
        let slot = runs
            .iter_mut()
            .find(|r| r.id == run.id)
            .ok_or_else(|| Error::NotFound(run.id.clone()))?;
        *slot = run.clone();
        Ok(run)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<JobRun>> {
        Ok(self.runs.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    fn get_recent(&self, limit: i64) -> Result<Vec<JobRun>> {
        let mut runs = self.runs.lock().unwrap().clone();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit.max(0) as usize);
        Ok(runs)
    }
}

// =========================================================================
// Datastore
// =========================================================================

#[derive(Default)]
pub struct InMemoryDatastore {
    records: Mutex<HashMap<String, ScreeningRecord>>,
    fail_upserts_for: Mutex<HashSet<String>>,
    reject_upserts_for: Mutex<HashSet<String>>,
}

impl InMemoryDatastore {
    pub fn with_records(records: Vec<ScreeningRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.symbol.clone(), record);
            }
        }
        store
    }

    /// Make every upsert of `symbol` fail with a database error.
    pub fn fail_upserts_for(&self, symbol: &str) {
        self.fail_upserts_for
            .lock()
            .unwrap()
            .insert(symbol.to_string());
    }

    /// Make every upsert of `symbol` fail with a validation error.
    pub fn reject_upserts_for(&self, symbol: &str) {
        self.reject_upserts_for
            .lock()
            .unwrap()
            .insert(symbol.to_string());
    }

    pub fn record(&self, symbol: &str) -> Option<ScreeningRecord> {
        self.records.lock().unwrap().get(symbol).cloned()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    fn query_stale(&self, max_age: Duration, limit: i64) -> Result<Vec<ScreeningRecord>> {
        let now = Utc::now();
        let mut stale: Vec<ScreeningRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.is_active && r.is_stale(max_age, now))
            .cloned()
            .collect();
        // None sorts before Some
        stale.sort_by(|a, b| a.last_updated.cmp(&b.last_updated));
        stale.truncate(limit.max(0) as usize);
        Ok(stale)
    }

    fn get_by_symbol(&self, symbol: &str) -> Result<Option<ScreeningRecord>> {
        Ok(self.record(&symbol.to_uppercase()))
    }

    fn freshness_stats(&self, max_age: Duration) -> Result<FreshnessStats> {
        let now = Utc::now();
        let mut stats = FreshnessStats::default();
        for record in self.records.lock().unwrap().values().filter(|r| r.is_active) {
            stats.total_active += 1;
            match record.last_updated {
                None => stats.never_updated += 1,
                Some(_) if record.is_stale(max_age, now) => stats.stale += 1,
                Some(_) => stats.fresh += 1,
            }
        }
        Ok(stats)
    }

    async fn upsert(&self, snapshot: ScreeningSnapshot) -> Result<ScreeningRecord> {
        let symbol = snapshot.normalized_symbol();
        if self.fail_upserts_for.lock().unwrap().contains(&symbol) {
            return Err(DatabaseError::QueryFailed("disk I/O error".to_string()).into());
        }
        if self.reject_upserts_for.lock().unwrap().contains(&symbol) {
            return Err(ValidationError::InvalidInput(format!("bad record {}", symbol)).into());
        }

        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let record = match records.remove(&symbol) {
            Some(mut existing) => {
                existing.merge_snapshot(snapshot, now);
                existing
            }
            None => ScreeningRecord::from_snapshot(snapshot, now),
        };
        records.insert(symbol, record.clone());
        Ok(record)
    }
}

// =========================================================================
// Provider
// =========================================================================

/// Provider that answers from a script and remembers every call.
#[derive(Default)]
pub struct ScriptedProvider {
    failing: HashSet<String>,
    listings: Vec<ListedSymbol>,
    fail_listing: bool,
    latency: Option<std::time::Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_listings(mut self, exchange: &str, symbols: &[&str]) -> Self {
        self.listings = symbols
            .iter()
            .map(|s| ListedSymbol {
                symbol: s.to_string(),
                exchange: exchange.to_string(),
                organ_name: None,
            })
            .collect();
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        "SCRIPTED"
    }

    async fn fetch(&self, symbol: &str) -> std::result::Result<ScreeningSnapshot, MarketDataError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(symbol) {
            return Err(MarketDataError::ProviderError {
                provider: self.id().to_string(),
                message: format!("no data for {}", symbol),
            });
        }
        let mut snapshot = ScreeningSnapshot::new(symbol);
        snapshot.current_price = Some(25_000.0);
        snapshot.pe = Some(12.5);
        Ok(snapshot)
    }

    async fn list_symbols(
        &self,
        exchange: &str,
    ) -> std::result::Result<Vec<ListedSymbol>, MarketDataError> {
        if self.fail_listing {
            return Err(MarketDataError::ProviderError {
                provider: self.id().to_string(),
                message: "listing unavailable".to_string(),
            });
        }
        Ok(self
            .listings
            .iter()
            .filter(|l| l.exchange == exchange)
            .cloned()
            .collect())
    }
}
