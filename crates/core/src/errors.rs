//! Core error types for the screening service.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;
use vnscreen_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the screening service.
///
/// Admission and cache failures reach callers synchronously through this type.
/// Inside refresh batches, `Provider` is a per-symbol failure while `Database`
/// stops the batch.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, unknown or revoked credential on a path that requires one.
    #[error("Invalid or missing API key")]
    Unauthenticated,

    /// Caller is over its budget for the current window.
    #[error("Rate limit exceeded: max {limit} requests per {reset_seconds}s")]
    RateLimitExceeded {
        limit: u32,
        remaining: u32,
        reset_seconds: u64,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Market data operation failed: {0}")]
    Provider(#[from] MarketDataError),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A job run was finalized a second time.
    #[error("Job run {0} is already finished")]
    JobAlreadyFinished(String),

    /// The scheduler was stopped and accepts no new runs.
    #[error("Refresh scheduler is stopped")]
    SchedulerStopped,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Persistence failures end a refresh batch; everything else is per-symbol.
    pub fn is_job_fatal(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for operator input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Unknown tier '{0}'")]
    UnknownTier(String),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Unexpected(format!("Background task failed: {}", err))
    }
}
