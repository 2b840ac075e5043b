//! Orchestrator errors and the stable error taxonomy.

use std::fmt;

use sanctum_apps::AppError;
use sanctum_hal::HalError;
use sanctum_kernel::KernelError;
use sanctum_store::StoreError;

/// Coarse classification callers can match on without knowing which
/// component failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidManifest,
    PermissionDenied,
    BridgeUnavailable,
    /// Storage, serialization, loading or configuration failures.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::InvalidManifest => "invalid manifest",
            Self::PermissionDenied => "permission denied",
            Self::BridgeUnavailable => "bridge unavailable",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] HalError),

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl SystemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Kernel(_) => ErrorKind::NotFound,
            Self::App(e) => app_kind(e),
            Self::Store(e) => store_kind(e),
            Self::Platform(e) => hal_kind(e),
            Self::Config { .. } => ErrorKind::Internal,
        }
    }
}

fn app_kind(err: &AppError) -> ErrorKind {
    match err {
        AppError::NotFound(_) | AppError::InstanceNotFound { .. } => ErrorKind::NotFound,
        AppError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
        AppError::InvalidManifest { .. } => ErrorKind::InvalidManifest,
        AppError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
        AppError::Store(e) => store_kind(e),
        AppError::Platform(e) => hal_kind(e),
        AppError::LoadFailed { .. } | AppError::Json(_) => ErrorKind::Internal,
    }
}

fn store_kind(err: &StoreError) -> ErrorKind {
    if err.is_not_found() {
        ErrorKind::NotFound
    } else {
        ErrorKind::Internal
    }
}

fn hal_kind(err: &HalError) -> ErrorKind {
    if err.is_unavailable() {
        ErrorKind::BridgeUnavailable
    } else {
        ErrorKind::Internal
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SystemError>;
