//! Sanctum app registry.
//!
//! Apps are described by an [`AppManifest`]. The [`AppRegistry`] owns every
//! known manifest (built-in `system.` apps plus installed ones), persists the
//! installed subset, lazily loads each app's code unit through an
//! [`AppLoader`], and hands out [`AppInstance`]s whose [`AppApi`] only
//! exposes the capabilities the manifest asks for.
//!
//! ## Architecture
//!
//! ```text
//! manifest ──► AppRegistry ──► AppLoader ──► Arc<dyn AppModule>   (memoized)
//!                  │
//!                  └──► AppInstance { storage: app:<id>:*, api: gated }
//!                            keyed by pid        files: fs:*
//! ```

pub mod builtin;
pub mod capability;
pub mod error;
pub mod fs;
pub mod instance;
pub mod loader;
pub mod manifest;
pub mod module;
pub mod registry;

pub use builtin::builtin_manifests;
pub use capability::Capability;
pub use error::{AppError, Result};
pub use fs::{FILES_PREFIX, FileStore};
pub use instance::{
    AppApi, AppInstance, ClipboardRead, ClipboardWrite, FsRead, FsWrite, Notifier,
    SystemInfoReader,
};
pub use loader::{AppLoader, BuiltinLoader};
pub use manifest::{AppEntry, AppManifest, AppWindows, SYSTEM_PREFIX, WindowSpec};
pub use module::AppModule;
pub use registry::{AppRegistry, INSTALLED_APPS_KEY};
