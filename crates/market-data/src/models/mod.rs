//! Market data models
//!
//! - `snapshot` - per-symbol screening attributes returned by providers
//! - `listing` - exchange listings used to seed full scans

mod listing;
mod snapshot;

pub use listing::{normalize_exchange, ListedSymbol};
pub use snapshot::ScreeningSnapshot;
