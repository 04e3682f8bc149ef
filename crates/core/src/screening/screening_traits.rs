//! Persistence contract for screening records.

use async_trait::async_trait;
use chrono::Duration;
use vnscreen_market_data::ScreeningSnapshot;

use super::screening_model::{FreshnessStats, ScreeningRecord};
use crate::errors::Result;

/// Storage for screening records, unique by symbol.
///
/// Reads are synchronous; writes go through the storage writer and are
/// each applied in their own transaction.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Active records never refreshed or refreshed more than `max_age` ago.
    ///
    /// Never-refreshed records come first, then oldest `last_updated` first.
    fn query_stale(&self, max_age: Duration, limit: i64) -> Result<Vec<ScreeningRecord>>;

    fn get_by_symbol(&self, symbol: &str) -> Result<Option<ScreeningRecord>>;

    fn freshness_stats(&self, max_age: Duration) -> Result<FreshnessStats>;

    /// Insert a record for the snapshot's symbol, or merge into the existing one.
    async fn upsert(&self, snapshot: ScreeningSnapshot) -> Result<ScreeningRecord>;
}
