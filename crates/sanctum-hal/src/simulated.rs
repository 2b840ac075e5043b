//! In-process host used by the CLI and by tests.
//!
//! Files and directories live in memory, the clipboard is a string, battery
//! and display state are whatever the caller last set, and native windows
//! are bookkeeping entries with ids starting at 1.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::channel::Channel;
use crate::error::{HalError, Result};
use crate::transport::BridgeTransport;
use crate::types::{
    BatteryInfo, CpuInfo, DisplayInfo, FileInfo, MemoryInfo, MessageBoxOptions,
    NativeWindowOptions, NetworkInterface, OpenDialogOptions, Rect, SaveDialogOptions,
    StorageInfo, SystemInfo,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NativeWindow {
    options: NativeWindowOptions,
    maximized: bool,
    minimized: bool,
}

#[derive(Debug, Default)]
struct HostState {
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    clipboard: String,
    windows: BTreeMap<u32, NativeWindow>,
    next_window: u32,
    focused_window: Option<u32>,
    disabled: HashSet<Channel>,
}

/// Simulated [`BridgeTransport`].
pub struct SimulatedTransport {
    state: Mutex<HostState>,
    battery: watch::Sender<Option<BatteryInfo>>,
    displays: watch::Sender<Vec<DisplayInfo>>,
    started: Instant,
    hostname: String,
}

impl SimulatedTransport {
    /// A host with a full, charging battery and one 1920x1080 display.
    pub fn new() -> Self {
        let display = DisplayInfo {
            id: 1,
            bounds: Rect {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            },
            work_area: Rect {
                x: 0,
                y: 0,
                width: 1920,
                height: 1040,
            },
            scale_factor: 1.0,
            rotation: 0,
            internal: Some(true),
        };
        let battery = BatteryInfo {
            level: 1.0,
            is_charging: true,
        };
        let mut dirs = BTreeSet::new();
        dirs.insert("/".to_owned());

        Self {
            state: Mutex::new(HostState {
                dirs,
                next_window: 1,
                ..HostState::default()
            }),
            battery: watch::Sender::new(Some(battery)),
            displays: watch::Sender::new(vec![display]),
            started: Instant::now(),
            hostname: "sanctum".to_owned(),
        }
    }

    /// Publish a new battery state on `hal:battery-changed`.
    pub fn set_battery(&self, battery: Option<BatteryInfo>) {
        self.battery.send_replace(battery);
    }

    /// Publish a new display list on `hal:display-changed`.
    pub fn set_displays(&self, displays: Vec<DisplayInfo>) {
        self.displays.send_replace(displays);
    }

    /// Make `channel` answer with [`HalError::Unsupported`].
    pub fn disable(&self, channel: Channel) {
        self.lock().disabled.insert(channel);
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, channel: Channel, args: Value) -> Result<Value> {
        let fail = |reason: String| HalError::Request { channel, reason };
        let mut guard = self.lock();
        let host = &mut *guard;
        if host.disabled.contains(&channel) {
            return Err(HalError::Unsupported(channel));
        }

        let value = match channel {
            Channel::GetSystemInfo => to_value(SystemInfo {
                platform: std::env::consts::OS.to_owned(),
                arch: std::env::consts::ARCH.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                hostname: self.hostname.clone(),
                uptime: self.started.elapsed().as_secs(),
            })?,
            Channel::GetBatteryInfo => to_value(*self.battery.borrow())?,
            Channel::GetDisplays => to_value(self.displays.borrow().clone())?,
            Channel::GetPlatform => Value::from(std::env::consts::OS),
            Channel::GetCpuInfo => to_value(vec![CpuInfo {
                model: "Simulated CPU".to_owned(),
                cores: 4,
                speed: 2400,
            }])?,
            Channel::GetMemoryInfo => {
                let used = host.files.values().map(|v| v.len() as u64).sum::<u64>();
                let total = 8 * 1024 * 1024 * 1024;
                to_value(MemoryInfo {
                    total,
                    free: total - used,
                    used,
                })?
            }
            Channel::GetStorageInfo => {
                let used = host.files.values().map(|v| v.len() as u64).sum::<u64>();
                let total = 256 * 1024 * 1024 * 1024;
                to_value(StorageInfo {
                    total,
                    free: total - used,
                    used,
                })?
            }
            Channel::GetNetworkInterfaces => to_value(vec![NetworkInterface {
                name: "lo".to_owned(),
                addresses: vec!["127.0.0.1".to_owned()],
            }])?,

            Channel::ReadFile => {
                let (path,): (String,) = args_of(args)?;
                let content = host
                    .files
                    .get(&path)
                    .cloned()
                    .ok_or_else(|| fail(format!("no such file: {path}")))?;
                Value::from(content)
            }
            Channel::WriteFile => {
                let (path, content): (String, String) = args_of(args)?;
                if host.dirs.contains(&path) {
                    return Err(fail(format!("is a directory: {path}")));
                }
                host.files.insert(path, content);
                Value::Null
            }
            Channel::ListDirectory => {
                let (path,): (String,) = args_of(args)?;
                if !host.dirs.contains(&path) {
                    return Err(fail(format!("no such directory: {path}")));
                }
                let prefix = dir_prefix(&path);
                let names: BTreeSet<String> = host
                    .files
                    .keys()
                    .chain(host.dirs.iter())
                    .filter_map(|entry| entry.strip_prefix(&prefix))
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .map(str::to_owned)
                    .collect();
                to_value(names)?
            }
            Channel::CreateDirectory => {
                let (path,): (String,) = args_of(args)?;
                if host.files.contains_key(&path) {
                    return Err(fail(format!("file exists: {path}")));
                }
                host.dirs.insert(path);
                Value::Null
            }
            Channel::DeleteFile => {
                let (path,): (String,) = args_of(args)?;
                if host.files.remove(&path).is_none() && !host.dirs.remove(&path) {
                    return Err(fail(format!("no such file: {path}")));
                }
                Value::Null
            }
            Channel::GetFileInfo => {
                let (path,): (String,) = args_of(args)?;
                let info = if let Some(content) = host.files.get(&path) {
                    FileInfo {
                        size: content.len() as u64,
                        is_directory: false,
                        is_file: true,
                        modified: None,
                    }
                } else if host.dirs.contains(&path) {
                    FileInfo {
                        size: 0,
                        is_directory: true,
                        is_file: false,
                        modified: None,
                    }
                } else {
                    return Err(fail(format!("no such file: {path}")));
                };
                to_value(info)?
            }

            Channel::ReadClipboard => Value::from(host.clipboard.clone()),
            Channel::WriteClipboard => {
                let (text,): (String,) = args_of(args)?;
                host.clipboard = text;
                Value::Null
            }

            // Dialogs answer as if the user accepted the default.
            Channel::ShowOpenDialog => {
                let (options,): (OpenDialogOptions,) = args_of(args)?;
                to_value(options.default_path.into_iter().collect::<Vec<_>>())?
            }
            Channel::ShowSaveDialog => {
                let (options,): (SaveDialogOptions,) = args_of(args)?;
                to_value(options.default_path)?
            }
            Channel::ShowMessageBox => {
                let (options,): (MessageBoxOptions,) = args_of(args)?;
                Value::from(options.default_id)
            }

            Channel::CreateWindow => {
                let (options,): (NativeWindowOptions,) = args_of(args)?;
                let id = host.next_window;
                host.next_window += 1;
                host.windows.insert(
                    id,
                    NativeWindow {
                        options,
                        ..NativeWindow::default()
                    },
                );
                Value::from(id)
            }
            Channel::CloseWindow => {
                let (id,): (u32,) = args_of(args)?;
                host.windows
                    .remove(&id)
                    .ok_or_else(|| fail(format!("no such window: {id}")))?;
                if host.focused_window == Some(id) {
                    host.focused_window = None;
                }
                Value::Null
            }
            Channel::FocusWindow | Channel::MinimizeWindow | Channel::MaximizeWindow => {
                let (id,): (u32,) = args_of(args)?;
                let window = host
                    .windows
                    .get_mut(&id)
                    .ok_or_else(|| fail(format!("no such window: {id}")))?;
                match channel {
                    Channel::MinimizeWindow => window.minimized = true,
                    Channel::MaximizeWindow => window.maximized = !window.maximized,
                    _ => {
                        window.minimized = false;
                        host.focused_window = Some(id);
                    }
                }
                Value::Null
            }
        };
        Ok(value)
    }

    /// Whether native window `id` is currently maximized.
    pub fn is_maximized(&self, id: u32) -> Option<bool> {
        self.lock().windows.get(&id).map(|w| w.maximized)
    }

    /// Whether native window `id` is currently minimized.
    pub fn is_minimized(&self, id: u32) -> Option<bool> {
        self.lock().windows.get(&id).map(|w| w.minimized)
    }

    pub fn focused_window(&self) -> Option<u32> {
        self.lock().focused_window
    }

    pub fn window_count(&self) -> usize {
        self.lock().windows.len()
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BridgeTransport for SimulatedTransport {
    async fn invoke(&self, channel: Channel, args: Value) -> Result<Value> {
        self.dispatch(channel, args)
    }

    fn battery_changes(&self) -> watch::Receiver<Option<BatteryInfo>> {
        self.battery.subscribe()
    }

    fn display_changes(&self) -> watch::Receiver<Vec<DisplayInfo>> {
        self.displays.subscribe()
    }
}

fn args_of<T: DeserializeOwned>(args: Value) -> Result<T> {
    Ok(serde_json::from_value(args)?)
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn dir_prefix(path: &str) -> String {
    if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn files_round_trip_and_list() {
        let host = SimulatedTransport::new();
        host.invoke(Channel::CreateDirectory, json!(["/docs"]))
            .await
            .unwrap();
        host.invoke(Channel::WriteFile, json!(["/docs/a.txt", "hello"]))
            .await
            .unwrap();
        host.invoke(Channel::WriteFile, json!(["/top.txt", "x"]))
            .await
            .unwrap();

        let content = host.invoke(Channel::ReadFile, json!(["/docs/a.txt"])).await.unwrap();
        assert_eq!(content, json!("hello"));

        let root = host.invoke(Channel::ListDirectory, json!(["/"])).await.unwrap();
        assert_eq!(root, json!(["docs", "top.txt"]));
        let docs = host.invoke(Channel::ListDirectory, json!(["/docs"])).await.unwrap();
        assert_eq!(docs, json!(["a.txt"]));
    }

    #[tokio::test]
    async fn missing_file_is_a_request_error() {
        let host = SimulatedTransport::new();
        let err = host
            .invoke(Channel::ReadFile, json!(["/nope"]))
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::Request { channel: Channel::ReadFile, .. }));
    }

    #[tokio::test]
    async fn malformed_args_are_payload_errors() {
        let host = SimulatedTransport::new();
        let err = host.invoke(Channel::ReadFile, json!([7])).await.unwrap_err();
        assert!(matches!(err, HalError::Payload(_)));
    }

    #[tokio::test]
    async fn native_window_ids_start_at_one_and_maximize_toggles() {
        let host = SimulatedTransport::new();
        let first = host
            .invoke(Channel::CreateWindow, json!([{}]))
            .await
            .unwrap();
        let second = host
            .invoke(Channel::CreateWindow, json!([{ "title": "b" }]))
            .await
            .unwrap();
        assert_eq!((first, second), (json!(1), json!(2)));

        host.invoke(Channel::MaximizeWindow, json!([1])).await.unwrap();
        assert_eq!(host.is_maximized(1), Some(true));
        host.invoke(Channel::MaximizeWindow, json!([1])).await.unwrap();
        assert_eq!(host.is_maximized(1), Some(false));

        host.invoke(Channel::CloseWindow, json!([2])).await.unwrap();
        assert_eq!(host.window_count(), 1);
        assert!(host.invoke(Channel::CloseWindow, json!([2])).await.is_err());
    }

    #[tokio::test]
    async fn disabled_channel_is_unsupported() {
        let host = SimulatedTransport::new();
        host.disable(Channel::GetBatteryInfo);
        let err = host
            .invoke(Channel::GetBatteryInfo, Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::Unsupported(Channel::GetBatteryInfo)));
    }

    #[test]
    fn battery_push_replaces_latest() {
        let host = SimulatedTransport::new();
        let rx = host.battery_changes();
        host.set_battery(Some(BatteryInfo {
            level: 0.5,
            is_charging: false,
        }));
        host.set_battery(None);
        assert_eq!(*rx.borrow(), None);
    }
}
