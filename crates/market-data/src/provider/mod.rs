//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - `HttpSnapshotProvider`, a JSON-over-HTTP provider

pub mod http;
mod traits;

pub use http::{HttpProviderConfig, HttpSnapshotProvider};
pub use traits::MarketDataProvider;
