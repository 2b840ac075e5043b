//! Bridge error types.

use crate::channel::Channel;

/// Unified error type for platform bridge calls.
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    /// The transport is missing or has not been initialized.
    #[error("platform bridge unavailable: {reason}")]
    BridgeUnavailable { reason: String },

    /// The host answered the request with an error.
    #[error("{channel} failed: {reason}")]
    Request { channel: Channel, reason: String },

    /// The host does not serve this channel.
    #[error("unsupported channel: {0}")]
    Unsupported(Channel),

    /// Arguments or response did not match the channel's payload shape.
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl HalError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::BridgeUnavailable { .. })
    }
}

/// Convenience alias used throughout the bridge crate.
pub type Result<T> = std::result::Result<T, HalError>;
