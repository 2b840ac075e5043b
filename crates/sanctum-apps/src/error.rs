//! Error types for the app registry.

use sanctum_hal::HalError;
use sanctum_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("app not found: `{0}`")]
    NotFound(String),

    #[error("no app instance for pid {pid}")]
    InstanceNotFound { pid: u32 },

    #[error("app `{id}` is already installed")]
    AlreadyExists { id: String },

    #[error("invalid manifest: missing `{field}`")]
    InvalidManifest { field: &'static str },

    #[error("permission denied for `{app_id}`: {reason}")]
    PermissionDenied { app_id: String, reason: String },

    #[error("failed to load app `{app_id}`: {reason}")]
    LoadFailed { app_id: String, reason: String },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("platform error: {0}")]
    Platform(#[from] HalError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InstanceNotFound { .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AppError>;
