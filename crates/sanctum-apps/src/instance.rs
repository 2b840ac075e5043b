//! Running app instances and their capability-gated API.
//!
//! An [`AppApi`] holds one optional entry per capability. An entry exists
//! only when the manifest granted the capability, so apps feature-detect
//! (`if let Some(fs) = api.fs_read()`) instead of calling and catching.

use std::collections::BTreeSet;

use sanctum_hal::{Bridge, SystemInfo};
use sanctum_notify::{NotificationData, NotificationId, NotificationService, Priority};
use sanctum_store::{KvStore, ScopedStore};

use crate::capability::Capability;
use crate::error::{AppError, Result};
use crate::fs::FileStore;
use crate::manifest::AppManifest;

/// One launch of an app.
#[derive(Debug)]
pub struct AppInstance {
    pub id: String,
    pub app_id: String,
    pub manifest: AppManifest,
    /// Exactly the manifest's permission strings.
    pub granted_permissions: BTreeSet<String>,
    /// Keys scoped under `app:<id>:`.
    pub storage: ScopedStore,
    pub api: AppApi,
}

// ── entries ──────────────────────────────────────────────────────────

/// `fs:read`
#[derive(Debug, Clone)]
pub struct FsRead {
    files: FileStore,
}

impl FsRead {
    pub async fn read_file(&self, path: &str) -> Result<String> {
        self.files.read(path).await
    }

    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        self.files.list(path).await
    }
}

/// `fs:write`
#[derive(Debug, Clone)]
pub struct FsWrite {
    files: FileStore,
}

impl FsWrite {
    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        self.files.write(path, content).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.files.remove(path).await
    }
}

/// `clipboard:read`
#[derive(Debug, Clone)]
pub struct ClipboardRead {
    bridge: Bridge,
}

impl ClipboardRead {
    pub async fn read(&self) -> Result<String> {
        Ok(self.bridge.read_clipboard().await?)
    }
}

/// `clipboard:write`
#[derive(Debug, Clone)]
pub struct ClipboardWrite {
    bridge: Bridge,
}

impl ClipboardWrite {
    pub async fn write(&self, text: &str) -> Result<()> {
        Ok(self.bridge.write_clipboard(text).await?)
    }
}

/// `notifications`: posts on behalf of the owning app.
#[derive(Debug, Clone)]
pub struct Notifier {
    app_id: String,
    service: NotificationService,
}

impl Notifier {
    pub fn notify(&self, title: &str, body: &str, priority: Priority) -> NotificationId {
        self.service
            .show(NotificationData::new(&self.app_id, title, body).with_priority(priority))
    }
}

/// `system:info`
#[derive(Debug, Clone)]
pub struct SystemInfoReader {
    bridge: Bridge,
}

impl SystemInfoReader {
    pub async fn get(&self) -> Result<SystemInfo> {
        Ok(self.bridge.system_info().await?)
    }
}

// ── api ──────────────────────────────────────────────────────────────

/// The function table an app may call.
#[derive(Debug, Clone)]
pub struct AppApi {
    app_id: String,
    fs_read: Option<FsRead>,
    fs_write: Option<FsWrite>,
    clipboard_read: Option<ClipboardRead>,
    clipboard_write: Option<ClipboardWrite>,
    notifications: Option<Notifier>,
    system_info: Option<SystemInfoReader>,
}

impl AppApi {
    pub(crate) fn new(
        app_id: &str,
        permissions: &BTreeSet<String>,
        store: &KvStore,
        bridge: &Bridge,
        notifications: &NotificationService,
    ) -> Self {
        let granted: BTreeSet<Capability> = permissions
            .iter()
            .filter_map(|p| Capability::parse(p))
            .collect();
        let has = |c: Capability| granted.contains(&c);
        let files = FileStore::new(store, app_id);

        Self {
            app_id: app_id.to_owned(),
            fs_read: has(Capability::FsRead).then(|| FsRead {
                files: files.clone(),
            }),
            fs_write: has(Capability::FsWrite).then(|| FsWrite { files }),
            clipboard_read: has(Capability::ClipboardRead).then(|| ClipboardRead {
                bridge: bridge.clone(),
            }),
            clipboard_write: has(Capability::ClipboardWrite).then(|| ClipboardWrite {
                bridge: bridge.clone(),
            }),
            notifications: has(Capability::Notifications).then(|| Notifier {
                app_id: app_id.to_owned(),
                service: notifications.clone(),
            }),
            system_info: has(Capability::SystemInfo).then(|| SystemInfoReader {
                bridge: bridge.clone(),
            }),
        }
    }

    pub fn fs_read(&self) -> Option<&FsRead> {
        self.fs_read.as_ref()
    }

    pub fn fs_write(&self) -> Option<&FsWrite> {
        self.fs_write.as_ref()
    }

    pub fn clipboard_read(&self) -> Option<&ClipboardRead> {
        self.clipboard_read.as_ref()
    }

    pub fn clipboard_write(&self) -> Option<&ClipboardWrite> {
        self.clipboard_write.as_ref()
    }

    pub fn notifications(&self) -> Option<&Notifier> {
        self.notifications.as_ref()
    }

    pub fn system_info(&self) -> Option<&SystemInfoReader> {
        self.system_info.as_ref()
    }

    pub fn exposes(&self, capability: Capability) -> bool {
        match capability {
            Capability::FsRead => self.fs_read.is_some(),
            Capability::FsWrite => self.fs_write.is_some(),
            Capability::ClipboardRead => self.clipboard_read.is_some(),
            Capability::ClipboardWrite => self.clipboard_write.is_some(),
            Capability::Notifications => self.notifications.is_some(),
            Capability::SystemInfo => self.system_info.is_some(),
        }
    }

    /// The capability entries this API exposes.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.exposes(*c))
    }

    /// `Ok` when `capability` is exposed, `PermissionDenied` otherwise.
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.exposes(capability) {
            Ok(())
        } else {
            Err(self.denied(capability))
        }
    }

    /// The error an app reports when a required entry is absent.
    pub fn denied(&self, capability: Capability) -> AppError {
        AppError::PermissionDenied {
            app_id: self.app_id.clone(),
            reason: format!("capability `{capability}` not granted"),
        }
    }
}
