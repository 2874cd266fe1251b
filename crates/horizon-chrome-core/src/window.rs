//! Window and monitor identity, and window state.

use std::fmt;
use std::num::NonZeroU64;

/// Opaque OS identity for a top-level window.
///
/// Handles are owned by the host UI framework. The chrome subsystem only
/// observes them; it never creates or destroys the main window.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(NonZeroU64);

impl WindowHandle {
    /// Wrap a raw native handle. Returns `None` for the null handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw native handle value.
    pub fn as_raw(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowHandle({:#x})", self.0)
    }
}

/// Opaque OS identity for a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(pub u64);

/// Placement state of a top-level window.
///
/// Always derived from the OS placement query rather than application
/// state, since the two can transiently disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowState {
    /// Restored window with its normal bounds.
    #[default]
    Normal,
    /// Window fills the work area (or monitor) it is on.
    Maximized,
    /// Window is minimized (iconified).
    Minimized,
}

impl WindowState {
    pub fn is_normal(&self) -> bool {
        matches!(self, WindowState::Normal)
    }

    pub fn is_maximized(&self) -> bool {
        matches!(self, WindowState::Maximized)
    }

    pub fn is_minimized(&self) -> bool {
        matches!(self, WindowState::Minimized)
    }
}
