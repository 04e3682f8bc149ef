//! Cache module - TTL result cache and key builder.

mod cache_key;
mod result_cache;

pub use cache_key::CacheKey;
pub use result_cache::{CacheStats, ResultCache, DEFAULT_CACHE_TTL};
