//! The app registry.
//!
//! Holds every known manifest, persists the non-system ones, memoizes
//! loaded modules per app id and tracks running instances by pid.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use sanctum_hal::Bridge;
use sanctum_notify::NotificationService;
use sanctum_store::KvStore;

use crate::builtin::builtin_manifests;
use crate::error::{AppError, Result};
use crate::instance::{AppApi, AppInstance};
use crate::loader::{AppLoader, BuiltinLoader};
use crate::manifest::{AppManifest, is_system_id};
use crate::module::AppModule;

/// Storage key holding the JSON array of installed (non-system) manifests.
pub const INSTALLED_APPS_KEY: &str = "system:installed-apps";

pub struct AppRegistry {
    apps: BTreeMap<String, AppManifest>,
    store: KvStore,
    notifications: NotificationService,
    bridge: Bridge,
    loader: Arc<dyn AppLoader>,
    modules: DashMap<String, Arc<dyn AppModule>>,
    instances: DashMap<u32, Arc<AppInstance>>,
}

impl AppRegistry {
    /// A registry seeded with the built-in apps, loading code through
    /// [`BuiltinLoader`].
    pub fn new(store: KvStore, notifications: NotificationService, bridge: Bridge) -> Self {
        Self::with_loader(store, notifications, bridge, Arc::new(BuiltinLoader))
    }

    pub fn with_loader(
        store: KvStore,
        notifications: NotificationService,
        bridge: Bridge,
        loader: Arc<dyn AppLoader>,
    ) -> Self {
        let apps = builtin_manifests()
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();
        Self {
            apps,
            store,
            notifications,
            bridge,
            loader,
            modules: DashMap::new(),
            instances: DashMap::new(),
        }
    }

    // ── manifests ──

    /// Register and persist a new app.
    pub async fn install(&mut self, manifest: AppManifest) -> Result<()> {
        manifest.validate()?;
        if self.apps.contains_key(&manifest.id) {
            return Err(AppError::AlreadyExists { id: manifest.id });
        }

        let id = manifest.id.clone();
        self.apps.insert(id.clone(), manifest);
        if let Err(e) = self.persist().await {
            self.apps.remove(&id);
            return Err(e);
        }
        tracing::info!(app_id = %id, "app installed");
        Ok(())
    }

    /// Remove an installed app and forget its loaded module.
    pub async fn uninstall(&mut self, id: &str) -> Result<AppManifest> {
        if is_system_id(id) {
            return Err(AppError::PermissionDenied {
                app_id: id.to_owned(),
                reason: "system apps cannot be uninstalled".into(),
            });
        }
        let manifest = self
            .apps
            .remove(id)
            .ok_or_else(|| AppError::NotFound(id.to_owned()))?;
        self.modules.remove(id);

        if let Err(e) = self.persist().await {
            self.apps.insert(id.to_owned(), manifest);
            return Err(e);
        }
        tracing::info!(app_id = %id, "app uninstalled");
        Ok(manifest)
    }

    /// Every known app, ordered by id.
    pub fn installed(&self) -> Vec<&AppManifest> {
        self.apps.values().collect()
    }

    pub fn get(&self, id: &str) -> Option<&AppManifest> {
        self.apps.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.apps.contains_key(id)
    }

    /// Apps flagged to launch at boot.
    pub fn autostart(&self) -> Vec<&AppManifest> {
        self.apps.values().filter(|m| m.autostart).collect()
    }

    async fn persist(&self) -> Result<()> {
        let installed: Vec<&AppManifest> = self.apps.values().filter(|m| !m.is_system()).collect();
        self.store.write_json(INSTALLED_APPS_KEY, &installed).await?;
        tracing::debug!(count = installed.len(), "installed apps persisted");
        Ok(())
    }

    /// Merge persisted manifests into the registry.
    ///
    /// Malformed entries, reserved ids and ids already registered are
    /// skipped; returns how many were added.
    pub async fn load_persisted(&mut self) -> Result<usize> {
        let raw = match self.store.read(INSTALLED_APPS_KEY).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = INSTALLED_APPS_KEY, error = %e, "persisted app list is malformed");
                return Ok(0);
            }
        };

        let mut added = 0;
        for entry in entries {
            let manifest = match serde_json::from_value::<AppManifest>(entry) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed persisted manifest");
                    continue;
                }
            };
            if let Err(e) = manifest.validate() {
                tracing::warn!(app_id = %manifest.id, error = %e, "skipping invalid persisted manifest");
                continue;
            }
            if manifest.is_system() || self.apps.contains_key(&manifest.id) {
                tracing::debug!(app_id = %manifest.id, "persisted manifest already registered");
                continue;
            }
            self.apps.insert(manifest.id.clone(), manifest);
            added += 1;
        }
        tracing::info!(count = added, "persisted apps loaded");
        Ok(added)
    }

    // ── code units ──

    /// Load the app's module, reusing a previous successful load.
    pub async fn load_app(&self, manifest: &AppManifest) -> Result<Arc<dyn AppModule>> {
        if let Some(module) = self.modules.get(&manifest.id) {
            return Ok(Arc::clone(module.value()));
        }
        let module = self.loader.load(manifest).await?;
        tracing::debug!(app_id = %manifest.id, module = module.name(), "app module loaded");
        self.modules
            .insert(manifest.id.clone(), Arc::clone(&module));
        Ok(module)
    }

    pub fn is_loaded(&self, app_id: &str) -> bool {
        self.modules.contains_key(app_id)
    }

    // ── instances ──

    /// Build a fresh instance for a registered app.
    pub fn create_instance(&self, app_id: &str, instance_id: impl Into<String>) -> Result<AppInstance> {
        let manifest = self
            .apps
            .get(app_id)
            .ok_or_else(|| AppError::NotFound(app_id.to_owned()))?;
        let granted_permissions = manifest.permissions.clone();
        let api = AppApi::new(
            app_id,
            &granted_permissions,
            &self.store,
            &self.bridge,
            &self.notifications,
        );
        Ok(AppInstance {
            id: instance_id.into(),
            app_id: app_id.to_owned(),
            manifest: manifest.clone(),
            storage: self.store.scoped(format!("app:{app_id}:")),
            granted_permissions,
            api,
        })
    }

    pub fn attach_instance(&self, pid: u32, instance: AppInstance) -> Arc<AppInstance> {
        let instance = Arc::new(instance);
        self.instances.insert(pid, Arc::clone(&instance));
        tracing::debug!(pid, app_id = %instance.app_id, "app instance attached");
        instance
    }

    pub fn instance(&self, pid: u32) -> Option<Arc<AppInstance>> {
        self.instances.get(&pid).map(|i| Arc::clone(i.value()))
    }

    pub fn release_instance(&self, pid: u32) -> Option<Arc<AppInstance>> {
        let (_, instance) = self.instances.remove(&pid)?;
        tracing::debug!(pid, app_id = %instance.app_id, "app instance released");
        Some(instance)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Drop every instance.
    pub fn release_all(&self) {
        self.instances.clear();
    }

    /// Feed one line of input to the instance running as `pid`.
    pub async fn send(&self, pid: u32, input: &str) -> Result<String> {
        let instance = self
            .instance(pid)
            .ok_or(AppError::InstanceNotFound { pid })?;
        let module = self.load_app(&instance.manifest).await?;
        module.invoke(&instance, input).await
    }
}

impl std::fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRegistry")
            .field("apps", &self.apps.keys().collect::<Vec<_>>())
            .field("loaded", &self.modules.len())
            .field("instances", &self.instances.len())
            .finish()
    }
}
