//! The user file namespace.
//!
//! Files live under their own `fs:` prefix in the key-value store, apart
//! from per-app storage (`app:<id>:`) and system records (`system:`).
//! Paths naming either of those reserved prefixes are refused outright.

use sanctum_store::{KvStore, ScopedStore};

use crate::error::{AppError, Result};

/// Store prefix every file path is placed under.
pub const FILES_PREFIX: &str = "fs:";

const RESERVED_PREFIXES: [&str; 2] = ["app:", "system:"];

/// Handle onto the shared file namespace, tagged with the app using it.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: ScopedStore,
    owner: String,
}

impl FileStore {
    pub fn new(store: &KvStore, owner: impl Into<String>) -> Self {
        Self {
            root: store.scoped(FILES_PREFIX),
            owner: owner.into(),
        }
    }

    fn check(&self, path: &str) -> Result<()> {
        match RESERVED_PREFIXES.iter().find(|p| path.starts_with(**p)) {
            Some(prefix) => Err(AppError::PermissionDenied {
                app_id: self.owner.clone(),
                reason: format!("path `{path}` is under reserved prefix `{prefix}`"),
            }),
            None => Ok(()),
        }
    }

    pub async fn read(&self, path: &str) -> Result<String> {
        self.check(path)?;
        Ok(self.root.read(path).await?)
    }

    pub async fn write(&self, path: &str, content: &str) -> Result<()> {
        self.check(path)?;
        Ok(self.root.write(path, content).await?)
    }

    pub async fn remove(&self, path: &str) -> Result<()> {
        self.check(path)?;
        Ok(self.root.remove(path).await?)
    }

    /// Paths starting with `prefix`, sorted.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.check(prefix)?;
        Ok(self.root.list(prefix).await?)
    }
}
