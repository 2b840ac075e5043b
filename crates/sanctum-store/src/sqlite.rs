//! SQLite durable tier with WAL mode and performance pragmas.
//!
//! The [`SqliteTier`] struct wraps a `rusqlite::Connection` behind an
//! `Arc<Mutex<>>` and runs every statement on the blocking pool via
//! `tokio::task::spawn_blocking`, so durable I/O never stalls the runtime.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::tier::DurableTier;

/// Current schema version, tracked in `PRAGMA user_version`.
const SCHEMA_VERSION: u32 = 1;

/// Thread-safe handle to a SQLite-backed key-value table.
#[derive(Clone)]
pub struct SqliteTier {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTier {
    /// Open (or create) a database at `path` and apply performance pragmas.
    ///
    /// This call blocks briefly (file I/O); prefer
    /// [`SqliteTier::open_and_migrate`] from async code.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening durable store");

        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory durable store");

        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database and bring the schema up to date.
    pub async fn open_and_migrate(path: impl AsRef<Path> + Send + 'static) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tier = tokio::task::spawn_blocking(move || Self::open(&path)).await??;
        tier.run_migrations().await?;
        Ok(tier)
    }

    /// Apply pending schema migrations.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        self.execute(|conn| {
            let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            if current >= SCHEMA_VERSION {
                debug!(version = current, "durable store schema up to date");
                return Ok(());
            }

            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE IF NOT EXISTS kv (
                     key        TEXT PRIMARY KEY NOT NULL,
                     value      TEXT NOT NULL,
                     updated_at INTEGER NOT NULL DEFAULT (unixepoch())
                 );
                 COMMIT;",
            )
            .map_err(|e| StoreError::Migration {
                version: SCHEMA_VERSION,
                message: e.to_string(),
            })?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

            info!(from = current, to = SCHEMA_VERSION, "durable store migrated");
            Ok(())
        })
        .await
    }

    /// Execute a closure against the connection on the blocking pool.
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            f(&conn)
        })
        .await?
    }

    // ── pragmas ──────────────────────────────────────────────────────

    fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
        // WAL mode: concurrent readers, non-blocking writes.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "busy_timeout", 5_000_i32)?;

        debug!("durable store pragmas applied (WAL, NORMAL sync)");
        Ok(())
    }
}

#[async_trait]
impl DurableTier for SqliteTier {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_owned();
        self.execute(move |conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_owned();
        let value = value.to_owned();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, unixepoch())
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_owned();
        self.execute(move |conn| {
            let n = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(n > 0)
        })
        .await
    }

    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let prefix = prefix.to_owned();
        self.execute(move |conn| {
            // substr() instead of LIKE so '%' and '_' in keys are literal.
            let mut stmt = conn.prepare(
                "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })
        .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
