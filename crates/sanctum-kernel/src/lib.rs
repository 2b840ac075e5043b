//! Sanctum kernel.
//!
//! The kernel is the authoritative owner of the simulated desktop's process
//! and window tables. Everything else in the workspace observes it; it
//! observes nothing.
//!
//! - **[`kernel`]** -- [`Kernel`] owns the process table, the window arena
//!   and the pid to owned-window index used for cascading termination.
//! - **[`events`]** -- [`EventBus`] is a typed dispatch table mapping each
//!   [`EventKind`] to an ordered listener list. Dispatch is synchronous.
//! - **[`types`]** -- [`Process`], [`Window`] and the [`WindowPatch`] option
//!   struct used for both window creation and partial updates.
//! - **[`error`]** -- [`KernelError`] via [`thiserror`].
//!
//! The kernel knows nothing about applications; it only tracks what is
//! running and which windows belong to it.

pub mod error;
pub mod events;
pub mod kernel;
pub mod types;

pub use error::{KernelError, Result};
pub use events::{EventBus, EventKind, KernelEvent, Listener, ListenerId};
pub use kernel::Kernel;
pub use types::{
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_X, DEFAULT_WINDOW_Y, Pid,
    Process, Window, WindowFlags, WindowFlagsPatch, WindowId, WindowPatch, WindowState,
};
