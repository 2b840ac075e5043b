//! Process and window records.
//!
//! A [`WindowPatch`] is the single option struct used both when creating a
//! window (merged over the documented defaults) and when updating one (merged
//! over the current record). Fields left as `None` are untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process identifier. Assigned from a strictly increasing counter.
pub type Pid = u32;

/// Default window origin when a config does not specify one.
pub const DEFAULT_WINDOW_X: i32 = 100;
/// Default window origin when a config does not specify one.
pub const DEFAULT_WINDOW_Y: i32 = 100;
/// Default window width when a config does not specify one.
pub const DEFAULT_WINDOW_WIDTH: u32 = 800;
/// Default window height when a config does not specify one.
pub const DEFAULT_WINDOW_HEIGHT: u32 = 600;

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// A running process as seen by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub icon: String,
}

// ---------------------------------------------------------------------------
// Window id
// ---------------------------------------------------------------------------

/// Opaque, unique window identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    /// Generate a fresh, time-ordered id.
    pub(crate) fn generate() -> Self {
        Self(format!("win_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Presentation state of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Minimized => write!(f, "minimized"),
            Self::Maximized => write!(f, "maximized"),
        }
    }
}

/// Window decoration capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFlags {
    pub resizable: bool,
    pub closable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
    pub always_on_top: bool,
}

impl Default for WindowFlags {
    /// Everything enabled except `always_on_top`.
    fn default() -> Self {
        Self {
            resizable: true,
            closable: true,
            minimizable: true,
            maximizable: true,
            always_on_top: false,
        }
    }
}

/// Partial form of [`WindowFlags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFlagsPatch {
    pub resizable: Option<bool>,
    pub closable: Option<bool>,
    pub minimizable: Option<bool>,
    pub maximizable: Option<bool>,
    pub always_on_top: Option<bool>,
}

impl WindowFlagsPatch {
    fn apply(&self, flags: &mut WindowFlags) {
        if let Some(v) = self.resizable {
            flags.resizable = v;
        }
        if let Some(v) = self.closable {
            flags.closable = v;
        }
        if let Some(v) = self.minimizable {
            flags.minimizable = v;
        }
        if let Some(v) = self.maximizable {
            flags.maximizable = v;
        }
        if let Some(v) = self.always_on_top {
            flags.always_on_top = v;
        }
    }
}

/// A window owned by a process.
///
/// `pid` is fixed at creation; `z_index` and `focused` are managed by the
/// kernel and can only change through focus requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: WindowId,
    pub pid: Pid,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub state: WindowState,
    pub flags: WindowFlags,
    pub z_index: u64,
    pub focused: bool,
}

impl Window {
    /// Build a window from the documented defaults, then merge `patch`.
    ///
    /// `focused` is always `false` here; focusing is the kernel's job.
    pub(crate) fn from_patch(
        id: WindowId,
        pid: Pid,
        default_title: &str,
        z_index: u64,
        patch: &WindowPatch,
    ) -> Self {
        let mut window = Self {
            id,
            pid,
            title: default_title.to_owned(),
            x: DEFAULT_WINDOW_X,
            y: DEFAULT_WINDOW_Y,
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            state: WindowState::Normal,
            flags: WindowFlags::default(),
            z_index,
            focused: false,
        };
        window.merge(patch);
        window
    }

    /// Merge every provided field except `focused`.
    pub(crate) fn merge(&mut self, patch: &WindowPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        patch.flags.apply(&mut self.flags);
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Recognised window fields for creation and partial update.
///
/// `pid`, `id` and `z_index` are intentionally absent: they are owned by the
/// kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowPatch {
    pub title: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub state: Option<WindowState>,
    pub flags: WindowFlagsPatch,
    pub focused: Option<bool>,
}

impl WindowPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.flags.resizable = Some(resizable);
        self
    }

    pub fn with_flags(mut self, flags: WindowFlagsPatch) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = Some(focused);
        self
    }
}
