//! Sanctum hardware/platform bridge.
//!
//! Everything the core needs from the host (system info, battery, displays,
//! files, clipboard, dialogs, native windows) crosses one boundary: a
//! [`BridgeTransport`] addressed by [`Channel`] name, wrapped by the typed
//! [`Bridge`] client.
//!
//! - **[`channel`]** -- request channel names (`hal:get-platform`, ...) and
//!   the two push channels.
//! - **[`transport`]** -- the [`BridgeTransport`] trait.
//! - **[`bridge`]** -- [`Bridge`]: typed calls, per-channel FIFO ordering,
//!   `BridgeUnavailable` before initialization.
//! - **[`simulated`]** -- [`SimulatedTransport`], an in-process host.
//! - **[`types`]** -- payload records.
//! - **[`error`]** -- [`HalError`].

pub mod bridge;
pub mod channel;
pub mod error;
pub mod simulated;
pub mod transport;
pub mod types;

pub use bridge::Bridge;
pub use channel::{BATTERY_CHANGED, Channel, DISPLAY_CHANGED};
pub use error::{HalError, Result};
pub use simulated::SimulatedTransport;
pub use transport::BridgeTransport;
pub use types::{
    BatteryInfo, CpuInfo, DisplayInfo, FileFilter, FileInfo, MemoryInfo, MessageBoxKind,
    MessageBoxOptions, NativeWindowOptions, NetworkInterface, OpenDialogOptions, Rect,
    SaveDialogOptions, StorageInfo, SystemInfo,
};
