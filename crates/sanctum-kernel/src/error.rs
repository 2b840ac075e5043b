//! Kernel error types.
//!
//! Every fallible kernel operation returns [`KernelError`]. Terminating an
//! unknown process is not an error; it returns `false`.

use crate::types::{Pid, WindowId};

/// Unified error type for the Sanctum kernel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// The pid does not reference a live process.
    #[error("process not found: {pid}")]
    ProcessNotFound {
        /// The pid that was looked up.
        pid: Pid,
    },

    /// The window id is not in the window table.
    #[error("window not found: {window_id}")]
    WindowNotFound {
        /// The id that was looked up.
        window_id: WindowId,
    },
}

impl KernelError {
    /// Every kernel error is a lookup failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProcessNotFound { .. } | Self::WindowNotFound { .. }
        )
    }
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, KernelError>;
