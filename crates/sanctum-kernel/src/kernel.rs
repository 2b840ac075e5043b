//! Process and window tables.
//!
//! Windows live in an arena keyed by [`WindowId`]. A secondary index maps
//! each pid to the ids of the windows it owns, in creation order, so that
//! terminating a process costs O(owned windows) rather than a scan of the
//! whole table.
//!
//! # Focus and stacking
//!
//! At most one window is focused. Every focus request (and every window
//! creation) assigns `z_index = top + 1`, where `top` is the highest z-index
//! handed out so far, so z-indices are distinct and strictly increasing in
//! request order.

use std::collections::{BTreeMap, HashMap};

use crate::error::{KernelError, Result};
use crate::events::{EventBus, EventKind, KernelEvent, ListenerId};
use crate::types::{Pid, Process, Window, WindowId, WindowPatch};

/// The authoritative process/window table and its event bus.
#[derive(Debug)]
pub struct Kernel {
    processes: BTreeMap<Pid, Process>,
    windows: HashMap<WindowId, Window>,
    /// pid -> owned window ids, creation order.
    owned: HashMap<Pid, Vec<WindowId>>,
    focused: Option<WindowId>,
    /// Last pid handed out. Never decreases.
    last_pid: Pid,
    /// Highest z-index handed out. Never decreases.
    top_z: u64,
    bus: EventBus,
}

impl Kernel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            processes: BTreeMap::new(),
            windows: HashMap::new(),
            owned: HashMap::new(),
            focused: None,
            last_pid: 0,
            top_z: 0,
            bus: EventBus::new(),
        }
    }

    // -- Events -------------------------------------------------------------

    /// Register a listener for one event kind. See [`EventBus::on`].
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&KernelEvent) + Send + 'static,
    {
        self.bus.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.bus.off(id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.bus.listener_count(kind)
    }

    // -- Processes ----------------------------------------------------------

    /// Register a new process and return its pid.
    pub fn create_process(&mut self, name: impl Into<String>, icon: impl Into<String>) -> Pid {
        self.last_pid += 1;
        let pid = self.last_pid;
        let process = Process {
            pid,
            name: name.into(),
            icon: icon.into(),
        };

        tracing::info!(pid, name = %process.name, "process created");

        self.processes.insert(pid, process.clone());
        self.bus.emit(&KernelEvent::ProcessCreated { process });
        pid
    }

    /// Terminate a process and close every window it owns.
    ///
    /// Returns `false` (and does nothing) when the pid is not live.
    pub fn terminate_process(&mut self, pid: Pid) -> bool {
        let Some(process) = self.processes.remove(&pid) else {
            tracing::debug!(pid, "terminate ignored: process not running");
            return false;
        };

        let owned = self.owned.remove(&pid).unwrap_or_default();
        let closed = owned.len();
        for id in owned {
            self.remove_window(&id);
        }

        tracing::info!(pid, name = %process.name, windows_closed = closed, "process terminated");

        self.bus.emit(&KernelEvent::ProcessTerminated { pid });
        true
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    /// All live processes in pid order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    // -- Windows ------------------------------------------------------------

    /// Create a window owned by `pid`, merging `config` over the defaults.
    pub fn create_window(&mut self, pid: Pid, config: WindowPatch) -> Result<WindowId> {
        let process = self
            .processes
            .get(&pid)
            .ok_or(KernelError::ProcessNotFound { pid })?;

        let id = WindowId::generate();
        self.top_z += 1;
        let window = Window::from_patch(id.clone(), pid, &process.name, self.top_z, &config);

        tracing::debug!(window_id = %id, pid, z_index = window.z_index, "window created");

        self.windows.insert(id.clone(), window.clone());
        self.owned.entry(pid).or_default().push(id.clone());
        self.bus.emit(&KernelEvent::WindowCreated { window });

        if config.focused == Some(true) {
            self.focus(&id);
        }
        Ok(id)
    }

    pub fn close_window(&mut self, id: &WindowId) -> Result<()> {
        let pid = self
            .windows
            .get(id)
            .map(|w| w.pid)
            .ok_or_else(|| KernelError::WindowNotFound {
                window_id: id.clone(),
            })?;

        if let Some(ids) = self.owned.get_mut(&pid) {
            ids.retain(|owned| owned != id);
        }
        self.remove_window(id);
        Ok(())
    }

    /// Merge `patch` into a window and emit the full result.
    ///
    /// `focused: Some(true)` raises the window to the top of the stack and
    /// clears focus on whichever window held it before.
    pub fn update_window(&mut self, id: &WindowId, patch: WindowPatch) -> Result<()> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or_else(|| KernelError::WindowNotFound {
                window_id: id.clone(),
            })?;

        window.merge(&patch);

        match patch.focused {
            Some(true) => {
                // focus() emits the update for this window.
                self.focus(id);
            }
            Some(false) => {
                window.focused = false;
                if self.focused.as_ref() == Some(id) {
                    self.focused = None;
                }
                let window = window.clone();
                self.emit_updated(window);
            }
            None => {
                let window = window.clone();
                self.emit_updated(window);
            }
        }

        tracing::debug!(window_id = %id, "window updated");
        Ok(())
    }

    pub fn window(&self, id: &WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// All windows, back to front.
    pub fn windows(&self) -> Vec<&Window> {
        let mut windows: Vec<&Window> = self.windows.values().collect();
        windows.sort_by_key(|w| w.z_index);
        windows
    }

    /// Windows owned by `pid`, in creation order.
    pub fn windows_of(&self, pid: Pid) -> Vec<&Window> {
        self.owned
            .get(&pid)
            .map(|ids| ids.iter().filter_map(|id| self.windows.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn focused_window(&self) -> Option<&Window> {
        self.focused.as_ref().and_then(|id| self.windows.get(id))
    }

    // -- Internals ----------------------------------------------------------

    /// Make `id` the unique focused window with the highest z-index.
    fn focus(&mut self, id: &WindowId) {
        if let Some(previous) = self.focused.take() {
            if previous != *id {
                if let Some(prev) = self.windows.get_mut(&previous) {
                    prev.focused = false;
                    let prev = prev.clone();
                    self.emit_updated(prev);
                }
            }
        }

        self.top_z += 1;
        let top = self.top_z;
        if let Some(window) = self.windows.get_mut(id) {
            window.focused = true;
            window.z_index = top;
            let window = window.clone();
            self.focused = Some(id.clone());
            tracing::debug!(window_id = %id, z_index = top, "window focused");
            self.emit_updated(window);
        }
    }

    /// Drop a window from the arena. Caller maintains the owner index.
    fn remove_window(&mut self, id: &WindowId) {
        if let Some(window) = self.windows.remove(id) {
            if self.focused.as_ref() == Some(id) {
                self.focused = None;
            }
            tracing::debug!(window_id = %id, pid = window.pid, "window closed");
            self.bus.emit(&KernelEvent::WindowClosed {
                id: id.clone(),
                pid: window.pid,
            });
        }
    }

    fn emit_updated(&mut self, window: Window) {
        self.bus.emit(&KernelEvent::WindowUpdated { window });
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
