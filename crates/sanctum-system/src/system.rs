//! The orchestrator.
//!
//! Every mutation goes to the component that owns the data (kernel, app
//! registry, notification service, store). The orchestrator's own state is
//! a [`Projection`] written only by listeners, read through
//! [`System::state`].

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use sanctum_apps::{AppError, AppManifest, AppRegistry, FileStore};
use sanctum_hal::{BATTERY_CHANGED, Bridge, DISPLAY_CHANGED};
use sanctum_kernel::{
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, EventKind, Kernel, KernelError, KernelEvent,
    ListenerId, Pid, WindowId, WindowPatch, WindowState,
};
use sanctum_notify::{NotificationData, NotificationId, NotificationService, Priority, Subscription};
use sanctum_store::{KvStore, SqliteTier};
use tokio::task::JoinHandle;

use crate::config::SystemConfig;
use crate::error::Result;
use crate::state::{Projection, SystemInfoSnapshot, SystemState};

/// App id used for notifications the system raises itself.
pub const SYSTEM_APP_ID: &str = "system";

fn write(projection: &RwLock<Projection>) -> RwLockWriteGuard<'_, Projection> {
    projection.write().unwrap_or_else(PoisonError::into_inner)
}

pub struct System {
    config: SystemConfig,
    kernel: Kernel,
    registry: AppRegistry,
    notifications: NotificationService,
    bridge: Bridge,
    store: KvStore,
    files: FileStore,
    projection: Arc<RwLock<Projection>>,
    booted: bool,
    listeners: Vec<ListenerId>,
    notification_sub: Option<Subscription>,
    push_tasks: Vec<JoinHandle<()>>,
}

impl System {
    pub fn new(config: SystemConfig, store: KvStore, bridge: Bridge) -> Self {
        let notifications = NotificationService::new();
        let registry = AppRegistry::new(store.clone(), notifications.clone(), bridge.clone());
        Self::with_parts(config, store, bridge, notifications, registry)
    }

    /// Assemble from explicitly constructed components.
    pub fn with_parts(
        config: SystemConfig,
        store: KvStore,
        bridge: Bridge,
        notifications: NotificationService,
        registry: AppRegistry,
    ) -> Self {
        Self {
            config,
            kernel: Kernel::new(),
            registry,
            notifications,
            bridge,
            files: FileStore::new(&store, SYSTEM_APP_ID),
            store,
            projection: Arc::new(RwLock::new(Projection::default())),
            booted: false,
            listeners: Vec::new(),
            notification_sub: None,
            push_tasks: Vec::new(),
        }
    }

    /// Build a system whose store follows `config.storage`. A database that
    /// cannot be opened leaves the system on the in-memory tier only.
    pub async fn open(config: SystemConfig, bridge: Bridge) -> Self {
        let store = if config.storage.in_memory {
            KvStore::in_memory()
        } else {
            match open_durable(&config.storage.path).await {
                Ok(tier) => {
                    tracing::info!(path = %config.storage.path.display(), "durable store opened");
                    KvStore::with_durable(tier)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %config.storage.path.display(),
                        error = %e,
                        "durable store unavailable, using memory only"
                    );
                    KvStore::in_memory()
                }
            }
        };
        Self::new(config, store, bridge)
    }

    // ── lifecycle ───────────────────────────────────────────────────────

    /// Bring the system up. Calling it again while booted does nothing.
    ///
    /// Platform failures degrade the snapshot (no battery, platform
    /// `"unknown"`) instead of failing the boot.
    pub async fn boot(&mut self) {
        if self.booted {
            return;
        }
        tracing::info!(version = %self.config.system.version, "booting");

        if let Err(e) = self.bridge.initialize().await {
            tracing::warn!(error = %e, "platform bridge unavailable, continuing degraded");
        }
        let battery = self.bridge.battery_info().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "battery info unavailable");
            None
        });
        let platform = match self.bridge.platform().await {
            Ok(platform) if !platform.is_empty() => platform,
            Ok(_) => "unknown".to_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "platform unavailable");
                "unknown".to_owned()
            }
        };
        let displays = self.bridge.displays().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "display list unavailable");
            Vec::new()
        });
        {
            let mut projection = write(&self.projection);
            projection.system_info = SystemInfoSnapshot {
                battery,
                platform,
                version: self.config.system.version.clone(),
            };
            projection.displays = displays;
        }

        self.subscribe_kernel();
        self.subscribe_notifications();
        self.forward_push_channels();

        if let Err(e) = self.registry.load_persisted().await {
            tracing::warn!(error = %e, "persisted apps could not be loaded");
        }
        self.sync_apps();
        self.booted = true;

        if self.config.system.autostart {
            let ids: Vec<String> = self
                .registry
                .autostart()
                .into_iter()
                .map(|m| m.id.clone())
                .collect();
            for id in ids {
                if let Err(e) = self.launch_app(&id).await {
                    tracing::warn!(app_id = %id, error = %e, "autostart failed");
                }
            }
        }

        self.notifications.show(NotificationData::new(
            SYSTEM_APP_ID,
            "System Ready",
            "Sanctum boot complete",
        ));
        tracing::info!("boot complete");
    }

    /// Close every window, terminate every process and reset the
    /// projections. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        let windows: Vec<WindowId> = self.kernel.windows().iter().map(|w| w.id.clone()).collect();
        for id in &windows {
            if let Err(e) = self.kernel.close_window(id) {
                tracing::debug!(window_id = %id, error = %e, "window already gone");
            }
        }
        let pids: Vec<Pid> = self.kernel.processes().map(|p| p.pid).collect();
        for pid in pids {
            self.terminate_process(pid);
        }
        self.registry.release_all();
        self.notifications.clear();

        for task in self.push_tasks.drain(..) {
            task.abort();
        }
        for id in self.listeners.drain(..) {
            self.kernel.off(id);
        }
        self.notification_sub = None;
        *write(&self.projection) = Projection::default();

        if self.booted {
            tracing::info!(windows = windows.len(), "shutdown complete");
        }
        self.booted = false;
    }

    fn subscribe_kernel(&mut self) {
        if !self.listeners.is_empty() {
            return;
        }
        {
            let mut projection = write(&self.projection);
            projection.windows = self
                .kernel
                .windows()
                .into_iter()
                .map(|w| (w.id.clone(), w.clone()))
                .collect();
            projection.processes = self.kernel.processes().map(|p| (p.pid, p.clone())).collect();
        }
        for kind in EventKind::ALL {
            let projection = Arc::clone(&self.projection);
            let id = self.kernel.on(kind, move |event| write(&projection).apply(event));
            self.listeners.push(id);
        }
    }

    fn subscribe_notifications(&mut self) {
        if self.notification_sub.is_some() {
            return;
        }
        let projection = Arc::clone(&self.projection);
        self.notification_sub = Some(
            self.notifications
                .subscribe(move |list| write(&projection).notifications = list.to_vec()),
        );
        write(&self.projection).notifications = self.notifications.get_all();
    }

    fn forward_push_channels(&mut self) {
        if !self.push_tasks.is_empty() {
            return;
        }
        match self.bridge.battery_changes() {
            Ok(mut rx) => {
                let projection = Arc::clone(&self.projection);
                self.push_tasks.push(tokio::spawn(async move {
                    while rx.changed().await.is_ok() {
                        let battery = *rx.borrow_and_update();
                        write(&projection).system_info.battery = battery;
                        tracing::trace!(channel = BATTERY_CHANGED, "push forwarded");
                    }
                }));
            }
            Err(e) => tracing::debug!(channel = BATTERY_CHANGED, error = %e, "push channel not forwarded"),
        }
        match self.bridge.display_changes() {
            Ok(mut rx) => {
                let projection = Arc::clone(&self.projection);
                self.push_tasks.push(tokio::spawn(async move {
                    while rx.changed().await.is_ok() {
                        let displays = rx.borrow_and_update().clone();
                        write(&projection).displays = displays;
                        tracing::trace!(channel = DISPLAY_CHANGED, "push forwarded");
                    }
                }));
            }
            Err(e) => tracing::debug!(channel = DISPLAY_CHANGED, error = %e, "push channel not forwarded"),
        }
    }

    fn sync_apps(&self) {
        write(&self.projection).apps = self.registry.installed().into_iter().cloned().collect();
    }

    // ── apps and processes ──────────────────────────────────────────────

    /// Start an app: a process, its loaded module, an instance and, when
    /// the manifest declares one, its main window. Fields the window spec
    /// leaves out default to 800x600, resizable, titled with the app name.
    pub async fn launch_app(&mut self, app_id: &str) -> Result<Pid> {
        let manifest = self
            .registry
            .get(app_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(app_id.to_owned()))?;

        let pid = self.kernel.create_process(&manifest.name, &manifest.icon);
        if let Err(e) = self.registry.load_app(&manifest).await {
            self.kernel.terminate_process(pid);
            return Err(e.into());
        }
        let instance = self.registry.create_instance(app_id, format!("{app_id}#{pid}"))?;
        self.registry.attach_instance(pid, instance);

        if let Some(spec) = manifest.windows.main {
            let config = WindowPatch::new()
                .with_title(spec.title.unwrap_or(manifest.name))
                .with_size(
                    spec.width.unwrap_or(DEFAULT_WINDOW_WIDTH),
                    spec.height.unwrap_or(DEFAULT_WINDOW_HEIGHT),
                )
                .with_resizable(spec.resizable.unwrap_or(true));
            self.kernel.create_window(pid, config)?;
        }

        tracing::info!(app_id, pid, "app launched");
        Ok(pid)
    }

    /// Same as [`System::terminate_process`].
    pub fn close_app(&mut self, pid: Pid) -> bool {
        self.terminate_process(pid)
    }

    /// Terminate `pid`, closing its windows and releasing its app instance.
    /// Returns `false` for an unknown pid.
    pub fn terminate_process(&mut self, pid: Pid) -> bool {
        let terminated = self.kernel.terminate_process(pid);
        self.registry.release_instance(pid);
        terminated
    }

    /// Deliver one line of input to the app running as `pid`.
    pub async fn send_to_app(&self, pid: Pid, input: &str) -> Result<String> {
        Ok(self.registry.send(pid, input).await?)
    }

    /// Greeting the app running as `pid` shows when it starts.
    pub async fn app_banner(&self, pid: Pid) -> Result<Option<String>> {
        let instance = self
            .registry
            .instance(pid)
            .ok_or(AppError::InstanceNotFound { pid })?;
        let module = self.registry.load_app(&instance.manifest).await?;
        Ok(module.banner())
    }

    /// Install an app and confirm with a `low` notification.
    pub async fn install_app(&mut self, manifest: AppManifest) -> Result<()> {
        let name = manifest.name.clone();
        self.registry.install(manifest).await?;
        self.sync_apps();
        self.notifications.show(
            NotificationData::new(SYSTEM_APP_ID, "App Installed", format!("{name} installed"))
                .with_priority(Priority::Low),
        );
        Ok(())
    }

    pub async fn uninstall_app(&mut self, app_id: &str) -> Result<AppManifest> {
        let manifest = self.registry.uninstall(app_id).await?;
        self.sync_apps();
        Ok(manifest)
    }

    // ── windows ─────────────────────────────────────────────────────────

    pub fn create_window(&mut self, pid: Pid, config: WindowPatch) -> Result<WindowId> {
        Ok(self.kernel.create_window(pid, config)?)
    }

    pub fn close_window(&mut self, id: &WindowId) -> Result<()> {
        Ok(self.kernel.close_window(id)?)
    }

    pub fn focus_window(&mut self, id: &WindowId) -> Result<()> {
        Ok(self
            .kernel
            .update_window(id, WindowPatch::new().with_focused(true))?)
    }

    /// Toggle between minimized and normal.
    pub fn minimize_window(&mut self, id: &WindowId) -> Result<()> {
        self.toggle_state(id, WindowState::Minimized)
    }

    /// Toggle between maximized and normal.
    pub fn maximize_window(&mut self, id: &WindowId) -> Result<()> {
        self.toggle_state(id, WindowState::Maximized)
    }

    pub fn update_window_position(&mut self, id: &WindowId, x: i32, y: i32) -> Result<()> {
        Ok(self
            .kernel
            .update_window(id, WindowPatch::new().with_position(x, y))?)
    }

    pub fn update_window_size(&mut self, id: &WindowId, width: u32, height: u32) -> Result<()> {
        Ok(self
            .kernel
            .update_window(id, WindowPatch::new().with_size(width, height))?)
    }

    fn toggle_state(&mut self, id: &WindowId, target: WindowState) -> Result<()> {
        let current = self
            .kernel
            .window(id)
            .map(|w| w.state)
            .ok_or_else(|| KernelError::WindowNotFound {
                window_id: id.clone(),
            })?;
        let next = if current == target {
            WindowState::Normal
        } else {
            target
        };
        Ok(self
            .kernel
            .update_window(id, WindowPatch::new().with_state(next))?)
    }

    // ── notifications ───────────────────────────────────────────────────

    pub fn show_notification(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        priority: Priority,
    ) -> NotificationId {
        self.notifications
            .show(NotificationData::new(SYSTEM_APP_ID, title, body).with_priority(priority))
    }

    pub fn dismiss_notification(&self, id: &NotificationId) {
        self.notifications.dismiss(id);
    }

    // ── files ───────────────────────────────────────────────────────────

    // Same `fs:` namespace the app file capabilities use.
    pub async fn read_file(&self, path: &str) -> Result<String> {
        Ok(self.files.read(path).await?)
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        Ok(self.files.write(path, content).await?)
    }

    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.files.list(path).await?)
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        Ok(self.files.remove(path).await?)
    }

    // ── observation ─────────────────────────────────────────────────────

    /// Observe kernel events directly. Listeners must not call back into
    /// this system.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&KernelEvent) + Send + 'static,
    {
        self.kernel.on(kind, listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.kernel.off(id)
    }

    // ── accessors ───────────────────────────────────────────────────────

    pub fn state(&self) -> SystemState {
        self.projection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(self.booted)
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }
}

impl Drop for System {
    fn drop(&mut self) {
        for task in self.push_tasks.drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("booted", &self.booted)
            .field("processes", &self.kernel.process_count())
            .field("windows", &self.kernel.window_count())
            .field("registry", &self.registry)
            .finish()
    }
}

async fn open_durable(path: &Path) -> Result<SqliteTier> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "could not create data directory");
        }
    }
    Ok(SqliteTier::open_and_migrate(path.to_owned()).await?)
}
