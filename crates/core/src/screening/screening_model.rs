//! Screening record domain models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use vnscreen_market_data::ScreeningSnapshot;

/// Stored screening attributes for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningRecord {
    pub id: String,
    /// Upper-cased, unique
    pub symbol: String,
    pub exchange: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub current_price: Option<f64>,
    pub price_change_30d: Option<f64>,
    pub volume: Option<f64>,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
    pub eps: Option<f64>,
    pub market_cap: Option<f64>,
    pub rsi: Option<f64>,
    pub score: Option<f64>,
    /// `None` until the first successful refresh
    pub last_updated: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

macro_rules! merge_fields {
    ($record:expr, $snapshot:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $snapshot.$field {
                $record.$field = Some(value);
            }
        )+
    };
}

impl ScreeningRecord {
    /// Build a new record from a snapshot, stamped at `now`.
    pub fn from_snapshot(snapshot: ScreeningSnapshot, now: DateTime<Utc>) -> Self {
        let mut record = Self::placeholder(&snapshot.symbol, now);
        record.merge_snapshot(snapshot, now);
        record
    }

    /// An active record that has never been refreshed.
    pub fn placeholder(symbol: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.trim().to_uppercase(),
            exchange: None,
            company_name: None,
            industry: None,
            sector: None,
            current_price: None,
            price_change_30d: None,
            volume: None,
            pe: None,
            pb: None,
            roe: None,
            eps: None,
            market_cap: None,
            rsi: None,
            score: None,
            last_updated: None,
            is_active: true,
            created_at: now,
        }
    }

    /// Overwrite every attribute the snapshot carries and refresh `last_updated`.
    ///
    /// Attributes missing from the snapshot keep their stored value.
    pub fn merge_snapshot(&mut self, snapshot: ScreeningSnapshot, now: DateTime<Utc>) {
        merge_fields!(
            self,
            snapshot,
            exchange,
            company_name,
            industry,
            sector,
            current_price,
            price_change_30d,
            volume,
            pe,
            pb,
            roe,
            eps,
            market_cap,
            rsi,
            score,
        );
        self.last_updated = Some(now);
    }

    /// Never refreshed, or last refreshed more than `max_age` before `now`.
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.last_updated {
            Some(updated) => now - updated > max_age,
            None => true,
        }
    }
}

/// Freshness breakdown of the active records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessStats {
    pub total_active: i64,
    pub fresh: i64,
    /// Refreshed before the cutoff
    pub stale: i64,
    pub never_updated: i64,
}

impl FreshnessStats {
    /// Percentage of active records that are fresh, two decimals.
    pub fn fresh_percentage(&self) -> f64 {
        if self.total_active == 0 {
            return 0.0;
        }
        (self.fresh as f64 / self.total_active as f64 * 10_000.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_merge_keeps_fields_missing_from_snapshot() {
        let mut first = ScreeningSnapshot::new("vnm");
        first.pe = Some(15.2);
        first.company_name = Some("Vinamilk".to_string());
        let mut record = ScreeningRecord::from_snapshot(first, at(1));
        assert_eq!(record.symbol, "VNM");
        assert_eq!(record.last_updated, Some(at(1)));

        let mut second = ScreeningSnapshot::new("VNM");
        second.pe = Some(16.0);
        second.rsi = Some(55.0);
        record.merge_snapshot(second, at(5));

        assert_eq!(record.pe, Some(16.0));
        assert_eq!(record.rsi, Some(55.0));
        assert_eq!(record.company_name.as_deref(), Some("Vinamilk"));
        assert_eq!(record.last_updated, Some(at(5)));
        assert_eq!(record.created_at, at(1));
    }

    #[test]
    fn test_staleness() {
        let record = ScreeningRecord::placeholder("FPT", at(0));
        assert!(record.is_stale(Duration::hours(24), at(1)));

        let refreshed = ScreeningRecord::from_snapshot(ScreeningSnapshot::new("FPT"), at(0));
        assert!(!refreshed.is_stale(Duration::hours(2), at(2)));
        assert!(refreshed.is_stale(Duration::hours(2), at(3)));
    }

    #[test]
    fn test_fresh_percentage() {
        let stats = FreshnessStats {
            total_active: 3,
            fresh: 1,
            stale: 1,
            never_updated: 1,
        };
        assert_eq!(stats.fresh_percentage(), 33.33);
        assert_eq!(FreshnessStats::default().fresh_percentage(), 0.0);
    }
}
