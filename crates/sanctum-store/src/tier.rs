//! Storage tiers.
//!
//! A [`DurableTier`] is anything that survives the process: the SQLite
//! backend in production, or a [`MemoryTier`] standing in for it in tests.
//! Durable I/O is an asynchronous boundary; the in-memory tier is not.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::StoreResult;

/// A tier that persists key/value pairs.
#[async_trait]
pub trait DurableTier: Send + Sync {
    /// Short name used in log fields (e.g. `"sqlite"`).
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Keys starting with `prefix`, in any order.
    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Ordered in-memory map. Always present as the fallback tier.
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Keys starting with `prefix`, ascending.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DurableTier for MemoryTier {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(MemoryTier::get(self, key))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        MemoryTier::put(self, key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(MemoryTier::delete(self, key))
    }

    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(MemoryTier::keys(self, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_keys_are_sorted() {
        let tier = MemoryTier::new();
        tier.put("b/2", "x");
        tier.put("a/1", "x");
        tier.put("b/1", "x");
        tier.put("c", "x");
        assert_eq!(tier.keys("b/"), vec!["b/1", "b/2"]);
        assert_eq!(tier.keys("").len(), 4);
    }

    #[test]
    fn delete_reports_presence() {
        let tier = MemoryTier::new();
        tier.put("k", "v");
        assert!(tier.delete("k"));
        assert!(!tier.delete("k"));
        assert!(tier.is_empty());
    }
}
