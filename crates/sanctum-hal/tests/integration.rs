//! Integration tests for the sanctum-hal crate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sanctum_hal::{
    BatteryInfo, Bridge, BridgeTransport, Channel, DisplayInfo, HalError, MessageBoxOptions,
    NativeWindowOptions, OpenDialogOptions, Rect, Result, SimulatedTransport,
};
use serde_json::Value;
use tokio::sync::watch;

/// Sleeps for `args[1]` ms, then records `args[0]`.
struct SlowEcho {
    log: Mutex<Vec<u64>>,
    battery: watch::Sender<Option<BatteryInfo>>,
    displays: watch::Sender<Vec<DisplayInfo>>,
}

impl SlowEcho {
    fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            battery: watch::Sender::new(None),
            displays: watch::Sender::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BridgeTransport for SlowEcho {
    async fn invoke(&self, _channel: Channel, args: Value) -> Result<Value> {
        let (tag, delay): (u64, u64) = serde_json::from_value(args)?;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.log.lock().unwrap().push(tag);
        Ok(Value::from(tag))
    }

    fn battery_changes(&self) -> watch::Receiver<Option<BatteryInfo>> {
        self.battery.subscribe()
    }

    fn display_changes(&self) -> watch::Receiver<Vec<DisplayInfo>> {
        self.displays.subscribe()
    }
}

async fn simulated() -> (Arc<SimulatedTransport>, Bridge) {
    let host = Arc::new(SimulatedTransport::new());
    let bridge = Bridge::new(host.clone());
    bridge.initialize().await.expect("simulated host connects");
    (host, bridge)
}

// ═══════════════════════════════════════════════════════════════════════
//  Ordering
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn same_channel_requests_complete_in_issue_order() {
    let echo = Arc::new(SlowEcho::new());
    let bridge = Bridge::new(echo.clone());
    bridge.initialize().await.unwrap();

    let calls = [(0u64, 30u64), (1, 20), (2, 10)].map(|(tag, delay)| {
        let bridge = bridge.clone();
        async move {
            bridge
                .call::<u64>(Channel::ReadFile, serde_json::json!([tag, delay]))
                .await
        }
    });
    let results = futures::future::join_all(calls).await;

    assert_eq!(
        results.into_iter().map(|r| r.unwrap()).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(*echo.log.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn different_channels_do_not_wait_for_each_other() {
    let echo = Arc::new(SlowEcho::new());
    let bridge = Bridge::new(echo.clone());
    bridge.initialize().await.unwrap();

    let slow = bridge.call::<u64>(Channel::ReadFile, serde_json::json!([0, 30]));
    let fast = bridge.call::<u64>(Channel::WriteFile, serde_json::json!([1, 10]));
    let (a, b) = futures::join!(slow, fast);
    assert_eq!((a.unwrap(), b.unwrap()), (0, 1));

    assert_eq!(*echo.log.lock().unwrap(), vec![1, 0]);
}

// ═══════════════════════════════════════════════════════════════════════
//  Typed calls over the simulated host
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn file_and_clipboard_channels() {
    let (_host, bridge) = simulated().await;

    bridge.create_directory("/notes").await.unwrap();
    bridge.write_file("/notes/todo.txt", "milk").await.unwrap();
    assert_eq!(bridge.read_file("/notes/todo.txt").await.unwrap(), "milk");
    assert_eq!(bridge.list_directory("/notes").await.unwrap(), vec!["todo.txt"]);

    let info = bridge.file_info("/notes/todo.txt").await.unwrap();
    assert!(info.is_file && !info.is_directory);
    assert_eq!(info.size, 4);

    bridge.delete_file("/notes/todo.txt").await.unwrap();
    let err = bridge.read_file("/notes/todo.txt").await.unwrap_err();
    assert!(matches!(err, HalError::Request { .. }));

    bridge.write_clipboard("copied").await.unwrap();
    assert_eq!(bridge.read_clipboard().await.unwrap(), "copied");
}

#[tokio::test]
async fn system_channels_report_host_state() {
    let (_host, bridge) = simulated().await;

    let info = bridge.system_info().await.unwrap();
    assert_eq!(info.platform, bridge.platform().await.unwrap());
    assert!(bridge.battery_info().await.unwrap().is_some());
    assert_eq!(bridge.displays().await.unwrap().len(), 1);
    assert!(!bridge.cpu_info().await.unwrap().is_empty());

    let memory = bridge.memory_info().await.unwrap();
    assert_eq!(memory.free + memory.used, memory.total);
    bridge.storage_info().await.unwrap();
    assert!(!bridge.network_interfaces().await.unwrap().is_empty());
}

#[tokio::test]
async fn dialogs_accept_defaults() {
    let (_host, bridge) = simulated().await;

    let picked = bridge
        .show_open_dialog(&OpenDialogOptions {
            default_path: Some("/a.txt".into()),
            ..OpenDialogOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(picked, vec!["/a.txt"]);

    let cancelled = bridge
        .show_open_dialog(&OpenDialogOptions::default())
        .await
        .unwrap();
    assert!(cancelled.is_empty());

    let button = bridge
        .show_message_box(&MessageBoxOptions {
            message: "Quit?".into(),
            buttons: vec!["Yes".into(), "No".into()],
            default_id: 1,
            ..MessageBoxOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(button, 1);
}

#[tokio::test]
async fn native_windows() {
    let (host, bridge) = simulated().await;

    let id = bridge
        .create_window(&NativeWindowOptions::default())
        .await
        .unwrap();
    assert_eq!(id, 1);

    bridge.minimize_window(id).await.unwrap();
    assert_eq!(host.is_minimized(id), Some(true));
    bridge.focus_window(id).await.unwrap();
    assert_eq!(host.is_minimized(id), Some(false));
    assert_eq!(host.focused_window(), Some(id));

    bridge.maximize_window(id).await.unwrap();
    assert_eq!(host.is_maximized(id), Some(true));
    bridge.close_window(id).await.unwrap();
    assert!(bridge.close_window(id).await.is_err());
}

// ═══════════════════════════════════════════════════════════════════════
//  Push channels
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn push_channels_deliver_latest_value() {
    let (host, bridge) = simulated().await;
    let mut battery = bridge.battery_changes().unwrap();
    let mut displays = bridge.display_changes().unwrap();

    host.set_battery(Some(BatteryInfo {
        level: 0.2,
        is_charging: false,
    }));
    host.set_battery(Some(BatteryInfo {
        level: 0.1,
        is_charging: false,
    }));
    battery.changed().await.unwrap();
    assert_eq!(battery.borrow_and_update().map(|b| b.level), Some(0.1));

    let second = DisplayInfo {
        id: 2,
        bounds: Rect::default(),
        work_area: Rect::default(),
        scale_factor: 2.0,
        rotation: 90,
        internal: None,
    };
    host.set_displays(vec![second.clone()]);
    displays.changed().await.unwrap();
    assert_eq!(*displays.borrow_and_update(), vec![second]);
}
