//! VN Screen Market Data Crate
//!
//! Provider-agnostic access to per-symbol screening snapshots.
//!
//! # Overview
//!
//! ```text
//! +------------------+      +---------------------+
//! |  Refresh worker  | ---> |  MarketDataProvider |  (trait, rate limited upstream)
//! +------------------+      +---------------------+
//!                                     |
//!                                     v
//!                           +---------------------+
//!                           |  ScreeningSnapshot  |
//!                           +---------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketDataProvider`] - fetch a snapshot per symbol, list an exchange
//! - [`ScreeningSnapshot`] - optional screening attributes for one symbol
//! - [`ListedSymbol`] - exchange listing entry
//! - [`MarketDataError`] - failures of a single provider call

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::{normalize_exchange, ListedSymbol, ScreeningSnapshot};
pub use provider::{HttpProviderConfig, HttpSnapshotProvider, MarketDataProvider};
