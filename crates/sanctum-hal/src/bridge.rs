//! Typed client over a [`BridgeTransport`].
//!
//! [`Bridge`] is the only way the core talks to the host. It refuses every
//! call until [`Bridge::initialize`] has succeeded, and it serialises
//! requests per channel: two calls on `hal:read-file` are answered in the
//! order they were issued, while calls on different channels may overlap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{Mutex, watch};

use crate::channel::Channel;
use crate::error::{HalError, Result};
use crate::transport::BridgeTransport;
use crate::types::{
    BatteryInfo, CpuInfo, DisplayInfo, FileInfo, MemoryInfo, MessageBoxOptions,
    NativeWindowOptions, NetworkInterface, OpenDialogOptions, SaveDialogOptions, StorageInfo,
    SystemInfo,
};

/// Cloneable handle to the platform bridge.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    transport: Option<Arc<dyn BridgeTransport>>,
    initialized: AtomicBool,
    /// One FIFO lane per channel, created on first use.
    lanes: DashMap<Channel, Arc<Mutex<()>>>,
}

impl Bridge {
    pub fn new(transport: Arc<dyn BridgeTransport>) -> Self {
        Self::build(Some(transport))
    }

    /// A bridge with no host behind it. Every call fails with
    /// [`HalError::BridgeUnavailable`], including [`Bridge::initialize`].
    pub fn detached() -> Self {
        Self::build(None)
    }

    fn build(transport: Option<Arc<dyn BridgeTransport>>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                transport,
                initialized: AtomicBool::new(false),
                lanes: DashMap::new(),
            }),
        }
    }

    /// Connect the transport. Idempotent once it has succeeded.
    pub async fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let transport = self.transport()?;
        transport.connect().await?;
        self.inner.initialized.store(true, Ordering::Release);
        tracing::info!("platform bridge initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    fn transport(&self) -> Result<&Arc<dyn BridgeTransport>> {
        self.inner
            .transport
            .as_ref()
            .ok_or_else(|| HalError::BridgeUnavailable {
                reason: "no transport".into(),
            })
    }

    fn ready(&self) -> Result<&Arc<dyn BridgeTransport>> {
        let transport = self.transport()?;
        if !self.is_initialized() {
            return Err(HalError::BridgeUnavailable {
                reason: "not initialized".into(),
            });
        }
        Ok(transport)
    }

    /// Issue a raw request on `channel` and decode the response.
    pub async fn call<T: DeserializeOwned>(&self, channel: Channel, args: Value) -> Result<T> {
        let transport = Arc::clone(self.ready()?);
        let lane = Arc::clone(&self.inner.lanes.entry(channel).or_default());

        let _turn = lane.lock().await;
        tracing::trace!(channel = %channel, "bridge request");
        let value = transport.invoke(channel, args).await.inspect_err(|e| {
            tracing::debug!(channel = %channel, error = %e, "bridge request failed");
        })?;
        Ok(serde_json::from_value(value)?)
    }

    // ── push channels ──

    /// Latest battery state, replaced on every `hal:battery-changed` push.
    pub fn battery_changes(&self) -> Result<watch::Receiver<Option<BatteryInfo>>> {
        Ok(self.ready()?.battery_changes())
    }

    /// Latest display list, replaced on every `hal:display-changed` push.
    pub fn display_changes(&self) -> Result<watch::Receiver<Vec<DisplayInfo>>> {
        Ok(self.ready()?.display_changes())
    }

    // ── system ──

    pub async fn system_info(&self) -> Result<SystemInfo> {
        self.call(Channel::GetSystemInfo, Value::Null).await
    }

    /// `None` when the host has no battery.
    pub async fn battery_info(&self) -> Result<Option<BatteryInfo>> {
        self.call(Channel::GetBatteryInfo, Value::Null).await
    }

    pub async fn displays(&self) -> Result<Vec<DisplayInfo>> {
        self.call(Channel::GetDisplays, Value::Null).await
    }

    pub async fn platform(&self) -> Result<String> {
        self.call(Channel::GetPlatform, Value::Null).await
    }

    pub async fn cpu_info(&self) -> Result<Vec<CpuInfo>> {
        self.call(Channel::GetCpuInfo, Value::Null).await
    }

    pub async fn memory_info(&self) -> Result<MemoryInfo> {
        self.call(Channel::GetMemoryInfo, Value::Null).await
    }

    pub async fn storage_info(&self) -> Result<StorageInfo> {
        self.call(Channel::GetStorageInfo, Value::Null).await
    }

    pub async fn network_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        self.call(Channel::GetNetworkInterfaces, Value::Null).await
    }

    // ── files ──

    pub async fn read_file(&self, path: &str) -> Result<String> {
        self.call(Channel::ReadFile, json!([path])).await
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        self.call(Channel::WriteFile, json!([path, content])).await
    }

    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        self.call(Channel::ListDirectory, json!([path])).await
    }

    pub async fn create_directory(&self, path: &str) -> Result<()> {
        self.call(Channel::CreateDirectory, json!([path])).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.call(Channel::DeleteFile, json!([path])).await
    }

    pub async fn file_info(&self, path: &str) -> Result<FileInfo> {
        self.call(Channel::GetFileInfo, json!([path])).await
    }

    // ── clipboard ──

    pub async fn read_clipboard(&self) -> Result<String> {
        self.call(Channel::ReadClipboard, Value::Null).await
    }

    pub async fn write_clipboard(&self, text: &str) -> Result<()> {
        self.call(Channel::WriteClipboard, json!([text])).await
    }

    // ── dialogs ──

    /// Selected paths; empty when the dialog was cancelled.
    pub async fn show_open_dialog(&self, options: &OpenDialogOptions) -> Result<Vec<String>> {
        self.call(Channel::ShowOpenDialog, json!([options])).await
    }

    /// Chosen path; `None` when the dialog was cancelled.
    pub async fn show_save_dialog(&self, options: &SaveDialogOptions) -> Result<Option<String>> {
        self.call(Channel::ShowSaveDialog, json!([options])).await
    }

    /// Index of the button that dismissed the box.
    pub async fn show_message_box(&self, options: &MessageBoxOptions) -> Result<u32> {
        self.call(Channel::ShowMessageBox, json!([options])).await
    }

    // ── native windows ──

    pub async fn create_window(&self, options: &NativeWindowOptions) -> Result<u32> {
        self.call(Channel::CreateWindow, json!([options])).await
    }

    pub async fn close_window(&self, id: u32) -> Result<()> {
        self.call(Channel::CloseWindow, json!([id])).await
    }

    pub async fn focus_window(&self, id: u32) -> Result<()> {
        self.call(Channel::FocusWindow, json!([id])).await
    }

    pub async fn minimize_window(&self, id: u32) -> Result<()> {
        self.call(Channel::MinimizeWindow, json!([id])).await
    }

    pub async fn maximize_window(&self, id: u32) -> Result<()> {
        self.call(Channel::MaximizeWindow, json!([id])).await
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("attached", &self.inner.transport.is_some())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedTransport;

    #[tokio::test]
    async fn calls_before_initialize_are_refused() {
        let bridge = Bridge::new(Arc::new(SimulatedTransport::new()));
        let err = bridge.platform().await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(bridge.battery_changes().is_err());

        bridge.initialize().await.unwrap();
        assert!(!bridge.platform().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn detached_bridge_never_initializes() {
        let bridge = Bridge::detached();
        assert!(bridge.initialize().await.unwrap_err().is_unavailable());
        assert!(bridge.displays().await.unwrap_err().is_unavailable());
        assert!(!bridge.is_initialized());
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let bridge = Bridge::new(Arc::new(SimulatedTransport::new()));
        bridge.initialize().await.unwrap();
        bridge.initialize().await.unwrap();
        assert!(bridge.is_initialized());
    }
}
