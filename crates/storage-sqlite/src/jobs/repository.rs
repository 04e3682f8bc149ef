//! Repository for job run persistence.

use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use vnscreen_core::errors::Result;
use vnscreen_core::jobs::{JobRun, JobRunRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::job_runs;

use super::model::JobRunDB;

pub struct JobRunRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl JobRunRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl JobRunRepositoryTrait for JobRunRepository {
    async fn create(&self, run: JobRun) -> Result<JobRun> {
        self.writer
            .exec(move |conn| {
                let db_model: JobRunDB = run.into();

                diesel::insert_into(job_runs::table)
                    .values(&db_model)
                    .execute(conn)
                    .into_core()?;

                Ok(db_model.into())
            })
            .await
    }

    async fn update(&self, run: JobRun) -> Result<JobRun> {
        self.writer
            .exec(move |conn| {
                let db_model: JobRunDB = run.into();

                diesel::update(job_runs::table.find(&db_model.id))
                    .set(&db_model)
                    .execute(conn)
                    .into_core()?;

                Ok(db_model.into())
            })
            .await
    }

    fn get_by_id(&self, id: &str) -> Result<Option<JobRun>> {
        let mut conn = get_connection(&self.pool)?;

        let result = job_runs::table
            .find(id)
            .select(JobRunDB::as_select())
            .first::<JobRunDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(Into::into))
    }

    fn get_recent(&self, limit: i64) -> Result<Vec<JobRun>> {
        let mut conn = get_connection(&self.pool)?;

        let results = job_runs::table
            .order(job_runs::started_at.desc())
            .limit(limit)
            .select(JobRunDB::as_select())
            .load::<JobRunDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Into::into).collect())
    }
}
