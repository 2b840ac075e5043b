//! Tiered key-value store and prefix-scoped views.
//!
//! [`KvStore`] is cheaply cloneable (`Arc`-backed). The memory tier is a
//! write-through cache in front of the optional durable tier. A mutation
//! reaches memory only after the durable tier accepted it, so a failed
//! durable write or delete is returned to the caller and leaves both tiers
//! holding the previous value.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::tier::{DurableTier, MemoryTier};

/// Two-tier key-value store.
#[derive(Clone)]
pub struct KvStore {
    durable: Option<Arc<dyn DurableTier>>,
    memory: Arc<MemoryTier>,
}

impl KvStore {
    /// A store with only the in-memory tier.
    pub fn in_memory() -> Self {
        Self {
            durable: None,
            memory: Arc::new(MemoryTier::new()),
        }
    }

    /// A store backed by `durable`, cached in memory.
    pub fn with_durable(durable: impl DurableTier + 'static) -> Self {
        Self::with_shared_durable(Arc::new(durable))
    }

    pub fn with_shared_durable(durable: Arc<dyn DurableTier>) -> Self {
        debug!(tier = durable.name(), "kv store created with durable tier");
        Self {
            durable: Some(durable),
            memory: Arc::new(MemoryTier::new()),
        }
    }

    pub fn has_durable(&self) -> bool {
        self.durable.is_some()
    }

    /// Read `key` from memory, then from the durable tier. Durable hits are
    /// cached.
    pub async fn read(&self, key: &str) -> StoreResult<String> {
        if let Some(value) = self.memory.get(key) {
            return Ok(value);
        }

        let not_found = || StoreError::NotFound {
            key: key.to_owned(),
        };
        let Some(durable) = &self.durable else {
            return Err(not_found());
        };
        match durable.get(key).await {
            Ok(Some(value)) => {
                self.memory.put(key, &value);
                Ok(value)
            }
            Ok(None) => Err(not_found()),
            Err(err) => {
                warn!(tier = durable.name(), key, %err, "durable read failed");
                Err(err)
            }
        }
    }

    /// Write `key` to the durable tier, then to memory.
    pub async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(durable) = &self.durable {
            if let Err(err) = durable.put(key, value).await {
                warn!(tier = durable.name(), key, %err, "durable write failed");
                return Err(err);
            }
        }
        self.memory.put(key, value);
        debug!(key, bytes = value.len(), "kv write");
        Ok(())
    }

    /// Remove `key` from both tiers. Fails if it was in neither.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut found = false;
        if let Some(durable) = &self.durable {
            match durable.delete(key).await {
                Ok(existed) => found = existed,
                Err(err) => {
                    warn!(tier = durable.name(), key, %err, "durable delete failed");
                    return Err(err);
                }
            }
        }
        found |= self.memory.delete(key);

        if found {
            debug!(key, "kv remove");
            Ok(())
        } else {
            Err(StoreError::NotFound {
                key: key.to_owned(),
            })
        }
    }

    /// Sorted, deduplicated keys starting with `prefix` across both tiers.
    pub async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys: BTreeSet<String> = self.memory.keys(prefix).into_iter().collect();
        if let Some(durable) = &self.durable {
            match durable.keys(prefix).await {
                Ok(found) => keys.extend(found),
                Err(err) => {
                    warn!(tier = durable.name(), prefix, %err, "durable list failed");
                    return Err(err);
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// Read and deserialize a JSON value.
    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<T> {
        let raw = self.read(key).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Serialize and write a JSON value.
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.write(key, &raw).await
    }

    /// A view of this store confined to keys under `prefix`.
    pub fn scoped(&self, prefix: impl Into<String>) -> ScopedStore {
        ScopedStore {
            prefix: prefix.into(),
            store: self.clone(),
        }
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for KvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore")
            .field("durable", &self.durable.as_ref().map(|d| d.name().to_owned()))
            .field("memory_entries", &self.memory.len())
            .finish()
    }
}

// ── scoped view ──────────────────────────────────────────────────────

/// A [`KvStore`] view that prefixes every key.
///
/// Keys passed in and returned from [`ScopedStore::list`] are relative to
/// the prefix.
#[derive(Clone, Debug)]
pub struct ScopedStore {
    prefix: String,
    store: KvStore,
}

impl ScopedStore {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub async fn read(&self, key: &str) -> StoreResult<String> {
        self.store.read(&self.key(key)).await.map_err(|err| match err {
            // Report the key the caller asked for, not the prefixed one.
            StoreError::NotFound { .. } => StoreError::NotFound {
                key: key.to_owned(),
            },
            other => other,
        })
    }

    pub async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.store.write(&self.key(key), value).await
    }

    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        self.store.remove(&self.key(key)).await
    }

    pub async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let keys = self.store.list(&self.key(prefix)).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(str::to_owned))
            .collect())
    }
}

// ── tests ────────────────────────────────────────────────────────────
