//! # sanctum-store
//!
//! Two-tier key-value storage for Sanctum.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  KvStore / ScopedStore (app:<id>: ...)  │
//! ├────────────────────┬────────────────────┤
//! │  DurableTier (opt) │  MemoryTier cache  │
//! │  SqliteTier (WAL)  │  always present    │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! Writes and deletes hit the durable tier first and reach memory only when
//! it succeeded. Reads are served from memory, falling through to the
//! durable tier on a miss. Listing returns the sorted, deduplicated union
//! of both tiers.
//!
//! ## Quick start
//!
//! ```ignore
//! use sanctum_store::{KvStore, SqliteTier};
//!
//! let durable = SqliteTier::open_and_migrate("data/sanctum.db").await?;
//! let store = KvStore::with_durable(durable);
//! store.write("notes/today", "hello").await?;
//! let keys = store.list("notes/").await?;
//! ```

pub mod error;
pub mod kv;
pub mod sqlite;
pub mod tier;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{StoreError, StoreResult};
pub use kv::{KvStore, ScopedStore};
pub use sqlite::SqliteTier;
pub use tier::{DurableTier, MemoryTier};
