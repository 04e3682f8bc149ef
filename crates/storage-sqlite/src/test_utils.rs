use std::sync::Arc;
use tempfile::TempDir;

use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool, WriteHandle};

/// A migrated database in a temporary directory. Keep the `TempDir` alive.
pub fn setup_db() -> (TempDir, Arc<DbPool>, WriteHandle) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("screener.db");
    let db_path = init(db_path.to_str().expect("utf-8 path")).expect("init db");
    let pool = create_pool(&db_path).expect("pool");
    run_migrations(&pool).expect("migrations");
    let writer = spawn_writer(pool.clone());
    (dir, pool, writer)
}
