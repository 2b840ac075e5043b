//! Sanctum system orchestrator.
//!
//! [`System`] wires the kernel, app registry, notification service, platform
//! bridge and key-value store together. It is the single entry point for
//! user intents (launch an app, focus a window, show a notification) and
//! keeps read projections of kernel state that are updated only from kernel
//! events.

pub mod config;
pub mod error;
pub mod state;
pub mod system;

pub use config::{LoggingConfig, StorageConfig, SystemConfig, SystemSection};
pub use error::{ErrorKind, Result, SystemError};
pub use state::{SystemInfoSnapshot, SystemState};
pub use system::System;

pub use sanctum_apps::{AppEntry, AppManifest, WindowSpec};
pub use sanctum_hal::{Bridge, SimulatedTransport};
pub use sanctum_kernel::{EventKind, KernelEvent, Pid, Window, WindowId, WindowPatch, WindowState};
pub use sanctum_notify::{NotificationId, Priority};
pub use sanctum_store::KvStore;
