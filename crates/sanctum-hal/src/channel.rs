//! Channel names for the platform boundary.
//!
//! Each request/response operation has its own channel. Requests on one
//! channel are answered in the order they were issued; there is no ordering
//! between channels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Push channel carrying the latest battery state.
pub const BATTERY_CHANGED: &str = "hal:battery-changed";
/// Push channel carrying the latest display list.
pub const DISPLAY_CHANGED: &str = "hal:display-changed";

/// A request/response channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    // System
    GetSystemInfo,
    GetBatteryInfo,
    GetDisplays,
    GetPlatform,
    GetCpuInfo,
    GetMemoryInfo,
    GetStorageInfo,
    GetNetworkInterfaces,
    // Files
    ReadFile,
    WriteFile,
    ListDirectory,
    CreateDirectory,
    DeleteFile,
    GetFileInfo,
    // Clipboard
    ReadClipboard,
    WriteClipboard,
    // Dialogs
    ShowOpenDialog,
    ShowSaveDialog,
    ShowMessageBox,
    // Native windows
    CreateWindow,
    CloseWindow,
    FocusWindow,
    MinimizeWindow,
    MaximizeWindow,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetSystemInfo => "hal:get-system-info",
            Self::GetBatteryInfo => "hal:get-battery-info",
            Self::GetDisplays => "hal:get-displays",
            Self::GetPlatform => "hal:get-platform",
            Self::GetCpuInfo => "hal:get-cpu-info",
            Self::GetMemoryInfo => "hal:get-memory-info",
            Self::GetStorageInfo => "hal:get-storage-info",
            Self::GetNetworkInterfaces => "hal:get-network-interfaces",
            Self::ReadFile => "hal:read-file",
            Self::WriteFile => "hal:write-file",
            Self::ListDirectory => "hal:list-directory",
            Self::CreateDirectory => "hal:create-directory",
            Self::DeleteFile => "hal:delete-file",
            Self::GetFileInfo => "hal:get-file-info",
            Self::ReadClipboard => "hal:read-clipboard",
            Self::WriteClipboard => "hal:write-clipboard",
            Self::ShowOpenDialog => "hal:show-open-dialog",
            Self::ShowSaveDialog => "hal:show-save-dialog",
            Self::ShowMessageBox => "hal:show-message-box",
            Self::CreateWindow => "hal:create-window",
            Self::CloseWindow => "hal:close-window",
            Self::FocusWindow => "hal:focus-window",
            Self::MinimizeWindow => "hal:minimize-window",
            Self::MaximizeWindow => "hal:maximize-window",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
