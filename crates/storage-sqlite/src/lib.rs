//! SQLite storage implementation for the VN stock screener.
//!
//! This crate is the only place where Diesel dependencies exist. It implements
//! the persistence traits defined in `vnscreen-core`:
//! - [`ScreeningRepository`] for `Datastore`
//! - [`JobRunRepository`] for `JobRunRepositoryTrait`
//!
//! Reads use pooled connections. Every write goes through the single writer
//! actor and runs in its own immediate transaction.
//!
//! ```text
//!        vnscreen-core (traits)
//!                  │
//!                  ▼
//!     storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod jobs;
pub mod schema;
pub mod screening;

#[cfg(test)]
mod test_utils;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};
pub use errors::{IntoCore, StorageError};
pub use jobs::JobRunRepository;
pub use screening::ScreeningRepository;

pub use vnscreen_core::errors::{DatabaseError, Error, Result};
