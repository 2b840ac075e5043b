//! The transport seam between the core and the host.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::channel::Channel;
use crate::error::Result;
use crate::types::{BatteryInfo, DisplayInfo};

/// A host that answers channel requests and pushes state changes.
///
/// Arguments and results are JSON. Arguments are positional: a JSON array
/// (or `null` for channels without arguments).
///
/// Push channels are exposed as [`watch`] receivers: observers only ever
/// see the latest battery state and display list, never a backlog.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Establish the connection. Called once by [`crate::Bridge::initialize`].
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn invoke(&self, channel: Channel, args: serde_json::Value) -> Result<serde_json::Value>;

    /// Latest value of [`crate::BATTERY_CHANGED`].
    fn battery_changes(&self) -> watch::Receiver<Option<BatteryInfo>>;

    /// Latest value of [`crate::DISPLAY_CHANGED`].
    fn display_changes(&self) -> watch::Receiver<Vec<DisplayInfo>>;
}
