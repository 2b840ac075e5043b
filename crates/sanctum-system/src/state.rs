//! Read projections of system state.
//!
//! The orchestrator never writes window or process entries directly; the
//! kernel listeners installed at boot are the only writers.

use std::collections::{BTreeMap, HashMap};

use sanctum_apps::AppManifest;
use sanctum_hal::{BatteryInfo, DisplayInfo};
use sanctum_kernel::{KernelEvent, Pid, Process, Window, WindowId};
use sanctum_notify::Notification;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfoSnapshot {
    pub battery: Option<BatteryInfo>,
    pub platform: String,
    pub version: String,
}

impl Default for SystemInfoSnapshot {
    fn default() -> Self {
        Self {
            battery: None,
            platform: "unknown".to_owned(),
            version: String::new(),
        }
    }
}

/// Point-in-time copy of everything the shell renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub is_booted: bool,
    /// Back to front.
    pub windows: Vec<Window>,
    /// Ascending pid.
    pub processes: Vec<Process>,
    /// Most recent first.
    pub notifications: Vec<Notification>,
    /// Ascending id.
    pub apps: Vec<AppManifest>,
    pub system_info: SystemInfoSnapshot,
    pub displays: Vec<DisplayInfo>,
}

/// Mutable projection shared with kernel and service listeners.
#[derive(Debug, Default)]
pub(crate) struct Projection {
    pub windows: HashMap<WindowId, Window>,
    pub processes: BTreeMap<Pid, Process>,
    pub notifications: Vec<Notification>,
    pub apps: Vec<AppManifest>,
    pub system_info: SystemInfoSnapshot,
    pub displays: Vec<DisplayInfo>,
}

impl Projection {
    pub fn apply(&mut self, event: &KernelEvent) {
        match event {
            KernelEvent::WindowCreated { window } | KernelEvent::WindowUpdated { window } => {
                self.windows.insert(window.id.clone(), window.clone());
            }
            KernelEvent::WindowClosed { id, .. } => {
                self.windows.remove(id);
            }
            KernelEvent::ProcessCreated { process } => {
                self.processes.insert(process.pid, process.clone());
            }
            KernelEvent::ProcessTerminated { pid } => {
                self.processes.remove(pid);
                self.windows.retain(|_, w| w.pid != *pid);
            }
        }
    }

    pub fn snapshot(&self, is_booted: bool) -> SystemState {
        let mut windows: Vec<Window> = self.windows.values().cloned().collect();
        windows.sort_by_key(|w| w.z_index);
        SystemState {
            is_booted,
            windows,
            processes: self.processes.values().cloned().collect(),
            notifications: self.notifications.clone(),
            apps: self.apps.clone(),
            system_info: self.system_info.clone(),
            displays: self.displays.clone(),
        }
    }
}
