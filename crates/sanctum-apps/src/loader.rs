//! Resolving a manifest's code unit.

use std::sync::Arc;

use async_trait::async_trait;

use crate::builtin;
use crate::error::{AppError, Result};
use crate::manifest::{AppEntry, AppManifest};
use crate::module::AppModule;

/// Turns a manifest's [`AppEntry`] into a runnable module.
#[async_trait]
pub trait AppLoader: Send + Sync {
    async fn load(&self, manifest: &AppManifest) -> Result<Arc<dyn AppModule>>;
}

/// Resolves [`AppEntry::Builtin`] names against the modules compiled into
/// this crate. External module paths are not loadable.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

#[async_trait]
impl AppLoader for BuiltinLoader {
    async fn load(&self, manifest: &AppManifest) -> Result<Arc<dyn AppModule>> {
        match &manifest.main {
            Some(AppEntry::Builtin { name }) => {
                builtin::module(name).ok_or_else(|| AppError::LoadFailed {
                    app_id: manifest.id.clone(),
                    reason: format!("unknown built-in module `{name}`"),
                })
            }
            Some(AppEntry::Module { path }) => Err(AppError::LoadFailed {
                app_id: manifest.id.clone(),
                reason: format!("external module `{path}` cannot be loaded by the built-in loader"),
            }),
            None => Err(AppError::InvalidManifest { field: "main" }),
        }
    }
}
