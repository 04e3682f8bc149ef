//! Database models for screening records.

use chrono::Utc;
use diesel::prelude::*;

use vnscreen_core::screening::ScreeningRecord;
use vnscreen_core::utils::time_utils::{format_timestamp, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::screening_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ScreeningRecordDB {
    pub id: String,
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
    pub last_updated: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<ScreeningRecordDB> for ScreeningRecord {
    fn from(db: ScreeningRecordDB) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            exchange: db.exchange,
            company_name: db.company_name,
            industry: db.industry,
            sector: db.sector,
            current_price: db.current_price,
            price_change_30d: db.price_change_30d,
            volume: db.volume,
            pe: db.pe,
            pb: db.pb,
            roe: db.roe,
            eps: db.eps,
            market_cap: db.market_cap,
            rsi: db.rsi,
            score: db.score,
            // An unreadable timestamp makes the record stale rather than fresh
            last_updated: db.last_updated.and_then(|s| parse_timestamp(&s).ok()),
            is_active: db.is_active,
            created_at: parse_timestamp(&db.created_at).unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<ScreeningRecord> for ScreeningRecordDB {
    fn from(domain: ScreeningRecord) -> Self {
        Self {
            id: domain.id,
            symbol: domain.symbol,
            exchange: domain.exchange,
            company_name: domain.company_name,
            industry: domain.industry,
            sector: domain.sector,
            current_price: domain.current_price,
            price_change_30d: domain.price_change_30d,
            volume: domain.volume,
            pe: domain.pe,
            pb: domain.pb,
            roe: domain.roe,
            eps: domain.eps,
            market_cap: domain.market_cap,
            rsi: domain.rsi,
            score: domain.score,
            last_updated: domain.last_updated.map(format_timestamp),
            is_active: domain.is_active,
            created_at: format_timestamp(domain.created_at),
        }
    }
}
