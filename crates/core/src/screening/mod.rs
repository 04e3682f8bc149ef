//! Screening module - stored records and their freshness.

mod screening_model;
mod screening_traits;

pub use screening_model::{FreshnessStats, ScreeningRecord};
pub use screening_traits::Datastore;
