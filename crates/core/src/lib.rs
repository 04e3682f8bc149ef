//! VN Screen Core - request admission and data freshness.
//!
//! This crate holds the credential registry, the sliding-window admission
//! controller, the TTL result cache, and the background refresh pipeline.
//! It is database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod admission;
pub mod cache;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod jobs;
pub mod refresh;
pub mod screening;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
