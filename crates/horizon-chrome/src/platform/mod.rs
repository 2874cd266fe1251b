//! The seam between the chrome subsystem and the operating system.
//!
//! Everything the chrome needs from the windowing system goes through
//! [`WindowPlatform`]. Queries are re-issued on every use rather than
//! cached, since a platform call may re-enter the interceptor and change
//! the answer.
//!
//! Two backends exist:
//!
//! - `win32` (Windows only): the native implementation plus the window
//!   subclass that feeds [`ChromeMessage`](crate::message::ChromeMessage)s
//!   into a [`ChromeWindow`](crate::interceptor::ChromeWindow)
//! - `sim` (`testing` feature): a deterministic in-memory desktop

use std::time::Duration;

use horizon_chrome_core::{
    ChromeResult, DevicePoint, DeviceRect, DpiScale, MonitorId, WindowHandle, WindowState,
};

use crate::config::{Color, CornerPreference};
use crate::glow::{GlowAppearance, GlowEdge};
use crate::hit_test::HitTestResult;
use crate::message::{WindowPos, WindowStyle};
use crate::monitor::{MonitorInfo, ScreenEdge};
use crate::system_menu::{SystemCommand, SystemMenuState};

pub mod theme;

#[cfg(any(test, feature = "testing"))]
pub mod sim;

#[cfg(target_os = "windows")]
pub mod win32;

pub use theme::ColorScheme;

/// One window's share of a position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPosUpdate {
    pub window: WindowHandle,
    pub pos: WindowPos,
}

impl WindowPosUpdate {
    pub fn new(window: WindowHandle, pos: WindowPos) -> Self {
        Self { window, pos }
    }
}

/// Operating system services used by the chrome subsystem.
///
/// All methods are called on the UI thread. Any method that changes window
/// geometry may synchronously deliver messages back into the interceptor
/// before it returns.
pub trait WindowPlatform {
    // =========================================================================
    // Window Queries
    // =========================================================================

    /// Check if `window` is a live window.
    fn is_window(&self, window: WindowHandle) -> bool;

    /// Outer window rectangle in device pixels.
    fn window_rect(&self, window: WindowHandle) -> Option<DeviceRect>;

    /// Placement state as reported by the OS.
    fn window_state(&self, window: WindowHandle) -> Option<WindowState>;

    fn is_visible(&self, window: WindowHandle) -> bool;

    fn dpi_scale(&self, window: WindowHandle) -> DpiScale;

    /// The owner of a top-level window, if any.
    fn owner(&self, window: WindowHandle) -> Option<WindowHandle>;

    fn window_style(&self, window: WindowHandle) -> WindowStyle;

    fn set_window_style(&self, window: WindowHandle, style: WindowStyle) -> ChromeResult<()>;

    // =========================================================================
    // Positioning
    // =========================================================================

    /// Move, size, show, hide or restack a single window.
    fn set_window_pos(&self, update: WindowPosUpdate) -> ChromeResult<()>;

    /// Apply several updates as one atomic multi-window operation.
    fn defer_window_pos(&self, updates: &[WindowPosUpdate]) -> ChromeResult<()>;

    /// Change the placement state (show command).
    fn set_window_state(&self, window: WindowHandle, state: WindowState) -> ChromeResult<()>;

    /// Start an OS-driven resize of `window` from the given border region.
    fn begin_resize(&self, window: WindowHandle, region: HitTestResult) -> ChromeResult<()>;

    // =========================================================================
    // Monitors
    // =========================================================================

    /// The monitor nearest to `rect`.
    fn monitor_from_rect(&self, rect: DeviceRect) -> Option<MonitorId>;

    /// The monitor nearest to the window's current position.
    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorId>;

    fn monitor_info(&self, monitor: MonitorId) -> Option<MonitorInfo>;

    /// The edge of an auto-hide taskbar on `monitor`, if one is confirmed.
    fn auto_hide_taskbar_edge(&self, monitor: &MonitorInfo) -> Option<ScreenEdge>;

    // =========================================================================
    // System Settings and Painting
    // =========================================================================

    /// Check if client-area animations are on (not reduced by the user).
    fn client_area_animation(&self) -> bool;

    /// The system light/dark preference.
    fn color_scheme(&self) -> ColorScheme {
        theme::system_color_scheme()
    }

    /// Fill the window's client area with a solid color.
    fn fill_background(&self, window: WindowHandle, color: Color) -> ChromeResult<()>;

    /// Check if the compositor can paint a colored window border.
    fn supports_native_border_color(&self) -> bool;

    /// Ask the compositor to paint the border in `color`, or to stop
    /// painting it with `None`. Returns whether the request was honored.
    fn set_native_border_color(&self, window: WindowHandle, color: Option<Color>) -> bool;

    fn set_corner_preference(
        &self,
        window: WindowHandle,
        preference: CornerPreference,
    ) -> ChromeResult<()>;

    // =========================================================================
    // Glow Windows
    // =========================================================================

    /// Create a hidden, non-activating glow window owned by `owner`.
    fn create_glow_window(&self, owner: WindowHandle, edge: GlowEdge)
    -> ChromeResult<WindowHandle>;

    fn destroy_window(&self, window: WindowHandle) -> ChromeResult<()>;

    /// Render glow pixels into a glow window.
    fn render_glow(&self, window: WindowHandle, appearance: &GlowAppearance) -> ChromeResult<()>;

    // =========================================================================
    // System Commands
    // =========================================================================

    /// Post a system command to the window's queue.
    fn post_system_command(&self, window: WindowHandle, command: SystemCommand)
    -> ChromeResult<()>;

    /// Show the system menu at `point` and wait for a choice.
    fn track_system_menu(
        &self,
        window: WindowHandle,
        point: DevicePoint,
        state: &SystemMenuState,
    ) -> Option<SystemCommand>;

    // =========================================================================
    // Dispatcher
    // =========================================================================

    /// Ask for a `ChromeMessage::Timer` to be delivered to `window` no
    /// later than `after` from now.
    fn request_wakeup(&self, _window: WindowHandle, _after: Duration) {}
}
