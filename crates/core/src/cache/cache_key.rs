//! Deterministic cache keys.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Builds a cache key from a namespace and every parameter that affects the result.
///
/// Parameters are sorted by name before hashing, so insertion order does not
/// change the key.
#[derive(Debug, Clone)]
pub struct CacheKey {
    namespace: String,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// `"<namespace>:<sha256 hex of the sorted parameters>"`
    ///
    /// Each name and value is hashed with its length in front, so no choice of
    /// names and values can spell out another parameter set.
    pub fn build(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, value) in &self.params {
            update_framed(&mut hasher, name);
            update_framed(&mut hasher, value);
        }
        format!("{}:{}", self.namespace, hex::encode(hasher.finalize()))
    }
}

fn update_framed(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_order_does_not_matter() {
        let a = CacheKey::new("screener").param("exchange", "HOSE").param("limit", 50);
        let b = CacheKey::new("screener").param("limit", 50).param("exchange", "HOSE");
        assert_eq!(a.build(), b.build());
    }

    #[test]
    fn test_every_parameter_participates() {
        let base = CacheKey::new("screener").param("exchange", "HOSE");
        let other_value = CacheKey::new("screener").param("exchange", "HNX");
        let extra = base.clone().param("limit", 10);
        let other_ns = CacheKey::new("stock").param("exchange", "HOSE");

        assert_ne!(base.build(), other_value.build());
        assert_ne!(base.build(), extra.build());
        assert_ne!(base.build(), other_ns.build());
        assert!(base.build().starts_with("screener:"));
    }

    #[test]
    fn test_name_value_boundaries_are_unambiguous() {
        let a = CacheKey::new("ns").param("ab", "c");
        let b = CacheKey::new("ns").param("a", "bc");
        assert_ne!(a.build(), b.build());
    }

    #[test]
    fn test_separators_inside_values_do_not_collide() {
        let a = CacheKey::new("ns").param("a=b", "c");
        let b = CacheKey::new("ns").param("a", "b=c");
        assert_ne!(a.build(), b.build());

        let one = CacheKey::new("ns").param("x", "1\ny=2");
        let two = CacheKey::new("ns").param("x", "1").param("y", "2");
        assert_ne!(one.build(), two.build());
    }

    #[test]
    fn test_empty_value_differs_from_missing_parameter() {
        let empty = CacheKey::new("ns").param("x", "");
        let missing = CacheKey::new("ns");
        assert_ne!(empty.build(), missing.build());
    }
}
