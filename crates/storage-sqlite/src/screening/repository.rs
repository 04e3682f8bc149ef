//! Repository for screening record persistence.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use vnscreen_core::errors::Result;
use vnscreen_core::screening::{Datastore, FreshnessStats, ScreeningRecord};
use vnscreen_core::utils::time_utils::format_timestamp;
use vnscreen_market_data::ScreeningSnapshot;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::screening_records;

use super::model::ScreeningRecordDB;

pub struct ScreeningRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ScreeningRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Insert a record as-is, or replace the stored one with the same symbol.
    #[cfg(test)]
    pub(crate) async fn save(&self, record: ScreeningRecord) -> Result<ScreeningRecord> {
        self.writer
            .exec(move |conn| {
                let db_model: ScreeningRecordDB = record.into();

                diesel::insert_into(screening_records::table)
                    .values(&db_model)
                    .on_conflict(screening_records::symbol)
                    .do_update()
                    .set(&db_model)
                    .execute(conn)
                    .into_core()?;

                Ok(db_model.into())
            })
            .await
    }
}

#[async_trait]
impl Datastore for ScreeningRepository {
    fn query_stale(&self, max_age: Duration, limit: i64) -> Result<Vec<ScreeningRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let cutoff = format_timestamp(Utc::now() - max_age);

        let results = screening_records::table
            .filter(screening_records::is_active.eq(true))
            .filter(
                screening_records::last_updated
                    .is_null()
                    .or(screening_records::last_updated.lt(cutoff)),
            )
            .order((
                screening_records::last_updated.is_not_null().asc(),
                screening_records::last_updated.asc(),
            ))
            .limit(limit)
            .select(ScreeningRecordDB::as_select())
            .load::<ScreeningRecordDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    fn get_by_symbol(&self, symbol: &str) -> Result<Option<ScreeningRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let result = screening_records::table
            .filter(screening_records::symbol.eq(symbol.trim().to_uppercase()))
            .select(ScreeningRecordDB::as_select())
            .first::<ScreeningRecordDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(Into::into))
    }

    fn freshness_stats(&self, max_age: Duration) -> Result<FreshnessStats> {
        let mut conn = get_connection(&self.pool)?;
        let cutoff = format_timestamp(Utc::now() - max_age);
        let active = screening_records::table.filter(screening_records::is_active.eq(true));

        let total_active = active
            .clone()
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()?;
        let fresh = active
            .clone()
            .filter(screening_records::last_updated.ge(cutoff.clone()))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()?;
        let stale = active
            .clone()
            .filter(screening_records::last_updated.lt(cutoff))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()?;
        let never_updated = active
            .filter(screening_records::last_updated.is_null())
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()?;

        Ok(FreshnessStats {
            total_active,
            fresh,
            stale,
            never_updated,
        })
    }

    async fn upsert(&self, snapshot: ScreeningSnapshot) -> Result<ScreeningRecord> {
        self.writer
            .exec(move |conn| {
                let symbol = snapshot.normalized_symbol();
                let now = Utc::now();

                let existing = screening_records::table
                    .filter(screening_records::symbol.eq(&symbol))
                    .select(ScreeningRecordDB::as_select())
                    .first::<ScreeningRecordDB>(conn)
                    .optional()
                    .into_core()?;

                let record = match existing {
                    Some(db) => {
                        let mut record: ScreeningRecord = db.into();
                        record.merge_snapshot(snapshot, now);
                        let db_model: ScreeningRecordDB = record.clone().into();
                        diesel::update(screening_records::table.find(&db_model.id))
                            .set(&db_model)
                            .execute(conn)
                            .into_core()?;
                        record
                    }
                    None => {
                        let record = ScreeningRecord::from_snapshot(snapshot, now);
                        let db_model: ScreeningRecordDB = record.clone().into();
                        diesel::insert_into(screening_records::table)
                            .values(&db_model)
                            .execute(conn)
                            .into_core()?;
                        record
                    }
                };

                Ok(record)
            })
            .await
    }
}
