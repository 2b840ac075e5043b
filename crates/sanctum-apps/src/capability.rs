//! Capabilities an app can be granted.

use std::fmt;

/// A permission string the app API understands.
///
/// Manifests may list other strings; they are recorded as granted but do
/// not unlock anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    FsRead,
    FsWrite,
    ClipboardRead,
    ClipboardWrite,
    Notifications,
    SystemInfo,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::FsRead,
        Capability::FsWrite,
        Capability::ClipboardRead,
        Capability::ClipboardWrite,
        Capability::Notifications,
        Capability::SystemInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FsRead => "fs:read",
            Self::FsWrite => "fs:write",
            Self::ClipboardRead => "clipboard:read",
            Self::ClipboardWrite => "clipboard:write",
            Self::Notifications => "notifications",
            Self::SystemInfo => "system:info",
        }
    }

    pub fn parse(permission: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == permission)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
