//! The chrome message interceptor and window state machine.
//!
//! [`ChromeWindow`] sits on a top-level window's message stream and answers
//! the questions the OS would otherwise answer with its own frame: how much
//! of the window is client area, what region is under the pointer, where a
//! maximized window goes, and whether a move should be clamped. It also
//! drives the [`GlowWindowCoordinator`] and the [`NonClientControlTracker`].
//!
//! # State machine
//!
//! ```text
//!            attach
//! Detached ─────────► Normal ◄──────► Maximized
//!    ▲                  ▲  │              │
//!    │ detach/destroy   │  ▼              │
//!    └──────────────── Minimized ◄────────┘
//! ```
//!
//! The attached states mirror the OS placement, which is re-queried before
//! every decision. Platform calls made from a handler may deliver further
//! messages into [`ChromeWindow::handle`] before they return; no interior
//! borrow is held across such a call.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use horizon_chrome_core::logging::targets;
use horizon_chrome_core::{
    ChromeError, ChromeResult, DevicePoint, DeviceRect, DeviceSize, LogicalPoint, LogicalRect,
    Thickness, TimerQueue, WindowHandle, WindowState,
};

use crate::config::{AppliedEffects, ChromeConfig};
use crate::glow::{GlowDeferGuard, GlowWindowCoordinator};
use crate::guard::ReentrancyGuard;
use crate::hit_test::{FlowDirection, HitTestResult, NonClientHitTester, ResizeMode};
use crate::message::{
    ChromeMessage, GlowMessage, MinMaxInfo, PosFlags, Reply, WindowPos, WindowStyle,
};
use crate::monitor::{MonitorInfo, MonitorResolver};
use crate::platform::{WindowPlatform, WindowPosUpdate};
use crate::system_menu::{SystemCommand, SystemCommandBridge};
use crate::tracker::{ClickOutcome, NonClientControlTracker};

// ============================================================================
// Constants
// ============================================================================

/// Extra client height added below a restored window to dodge resize
/// flicker, in logical units.
pub const FLICKER_PADDING: f64 = 1.0;

// ============================================================================
// Host
// ============================================================================

/// Queries and notifications provided by the host UI framework.
///
/// Points are relative to the window's top-left corner, in logical units.
pub trait ChromeHost {
    /// Check if application content at `point` should receive input even
    /// though it lies inside the caption or border.
    fn is_client_hit_test_visible(&self, _point: LogicalPoint) -> bool {
        false
    }

    fn resize_mode(&self) -> ResizeMode {
        ResizeMode::CanResize
    }

    fn flow_direction(&self) -> FlowDirection {
        FlowDirection::LeftToRight
    }

    /// The non-client area gained or lost activation.
    fn nc_active_changed(&self, _active: bool) {}

    fn window_state_changed(&self, _state: WindowState) {}

    /// The visual border the host should draw changed.
    fn border_thickness_changed(&self, _thickness: Thickness) {}
}

/// A host with default answers and no notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHost;

impl ChromeHost for DefaultHost {}

// ============================================================================
// Chrome State
// ============================================================================

/// State of the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromeState {
    Detached,
    Normal,
    Maximized,
    Minimized,
}

impl ChromeState {
    pub fn is_attached(&self) -> bool {
        !matches!(self, ChromeState::Detached)
    }
}

impl From<WindowState> for ChromeState {
    fn from(state: WindowState) -> Self {
        match state {
            WindowState::Normal => ChromeState::Normal,
            WindowState::Maximized => ChromeState::Maximized,
            WindowState::Minimized => ChromeState::Minimized,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for attaching a [`ChromeWindow`].
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use horizon_chrome::prelude::*;
/// use horizon_chrome::platform::sim::SimPlatform;
/// use horizon_chrome_core::DeviceRect;
///
/// let sim = Rc::new(SimPlatform::single_monitor());
/// let main = sim.create_window(DeviceRect::new(100, 100, 900, 700));
///
/// let chrome = ChromeWindow::builder()
///     .with_config(ChromeConfig::new().with_caption_height(32.0))
///     .attach(sim.clone(), main.as_raw())
///     .unwrap();
/// assert!(chrome.state().is_attached());
/// ```
#[derive(Default)]
pub struct ChromeWindowBuilder {
    config: ChromeConfig,
    host: Option<Rc<dyn ChromeHost>>,
    timers: Option<Rc<TimerQueue>>,
}

impl ChromeWindowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ChromeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_host(mut self, host: Rc<dyn ChromeHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Use a shared timer queue instead of a private one on the wall clock.
    pub fn with_timers(mut self, timers: Rc<TimerQueue>) -> Self {
        self.timers = Some(timers);
        self
    }

    /// Attach to the native window `raw_handle`.
    ///
    /// Fails with [`ChromeError::InvalidWindowHandle`] when the handle is
    /// null or not a live window. The caller must route the window's
    /// messages to [`ChromeWindow::handle`] and then call
    /// [`ChromeWindow::refresh_frame`].
    pub fn attach(
        self,
        platform: Rc<dyn WindowPlatform>,
        raw_handle: u64,
    ) -> ChromeResult<Rc<ChromeWindow>> {
        let handle = WindowHandle::from_raw(raw_handle)
            .filter(|handle| platform.is_window(*handle) && platform.window_rect(*handle).is_some());
        let Some(handle) = handle else {
            tracing::error!(target: targets::INTERCEPTOR, raw_handle, "attach without a valid window handle");
            return Err(ChromeError::InvalidWindowHandle);
        };

        let state = platform.window_state(handle).unwrap_or_default();
        let timers = self.timers.unwrap_or_else(|| Rc::new(TimerQueue::new()));
        let host = self.host.unwrap_or_else(|| Rc::new(DefaultHost));
        let glow = GlowWindowCoordinator::new(
            handle,
            platform.clone(),
            timers.clone(),
            self.config.glow.clone(),
            self.config.corner_grip,
        );
        let native_border_supported = platform.supports_native_border_color();

        let window = Rc::new(ChromeWindow {
            handle,
            platform,
            host,
            timers,
            config: RefCell::new(self.config),
            state: Cell::new(state.into()),
            tracker: NonClientControlTracker::new(),
            glow,
            nc_active: Cell::new(false),
            dragging: Cell::new(false),
            background_erased: Cell::new(false),
            painted: Cell::new(false),
            correcting_position: Cell::new(false),
            border_thickness: Cell::new(Thickness::ZERO),
            native_border_supported,
        });
        window.initialize();
        Ok(window)
    }
}

// ============================================================================
// Chrome Window
// ============================================================================

/// Custom chrome attached to one top-level window.
///
/// Single-threaded: every method must be called on the thread that owns
/// the window.
pub struct ChromeWindow {
    handle: WindowHandle,
    platform: Rc<dyn WindowPlatform>,
    host: Rc<dyn ChromeHost>,
    timers: Rc<TimerQueue>,
    config: RefCell<ChromeConfig>,
    state: Cell<ChromeState>,
    tracker: NonClientControlTracker,
    glow: Rc<GlowWindowCoordinator>,
    nc_active: Cell<bool>,
    /// The user is dragging or sizing through the modal move loop.
    dragging: Cell<bool>,
    background_erased: Cell<bool>,
    painted: Cell<bool>,
    correcting_position: Cell<bool>,
    /// Last effective border reported to the host.
    border_thickness: Cell<Thickness>,
    native_border_supported: bool,
}

static_assertions::assert_not_impl_any!(ChromeWindow: Send, Sync);

impl fmt::Debug for ChromeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeWindow")
            .field("handle", &self.handle)
            .field("state", &self.state.get())
            .field("nc_active", &self.nc_active.get())
            .field("dragging", &self.dragging.get())
            .field("glow", &self.glow)
            .finish_non_exhaustive()
    }
}

impl ChromeWindow {
    pub fn builder() -> ChromeWindowBuilder {
        ChromeWindowBuilder::new()
    }

    fn initialize(&self) {
        let config = self.config();
        self.apply_style_bits(&config);
        self.apply_corner_preference(&config);
        self.glow.set_resize_enabled(self.host.resize_mode().allows_resize());
        self.glow.refresh_native_border();
        self.refresh_border_thickness();
        self.glow.update_visibility(true);
        tracing::debug!(
            target: targets::INTERCEPTOR,
            window = ?self.handle,
            state = ?self.state.get(),
            "chrome attached"
        );
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn window_handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn state(&self) -> ChromeState {
        self.state.get()
    }

    /// Check if the non-client area is drawn as active.
    pub fn is_nc_active(&self) -> bool {
        self.nc_active.get()
    }

    /// Check if the platform can paint a colored window border.
    pub fn supports_native_border_color(&self) -> bool {
        self.native_border_supported
    }

    pub fn config(&self) -> ChromeConfig {
        self.config.borrow().clone()
    }

    pub fn tracker(&self) -> &NonClientControlTracker {
        &self.tracker
    }

    pub fn glow(&self) -> &GlowWindowCoordinator {
        &self.glow
    }

    pub fn timers(&self) -> &Rc<TimerQueue> {
        &self.timers
    }

    /// The visual border the host should draw in the current state.
    pub fn effective_border_thickness(&self) -> Thickness {
        let config = self.config.borrow();
        if self.state.get() == ChromeState::Maximized && !config.keep_border_on_maximize {
            Thickness::ZERO
        } else {
            config.border_thickness
        }
    }

    /// The OS placement, falling back to the last known state.
    fn query_state(&self) -> WindowState {
        match self.platform.window_state(self.handle) {
            Some(state) => state,
            None => {
                tracing::warn!(target: targets::INTERCEPTOR, window = ?self.handle, "placement query failed");
                match self.state.get() {
                    ChromeState::Maximized => WindowState::Maximized,
                    ChromeState::Minimized => WindowState::Minimized,
                    _ => WindowState::Normal,
                }
            }
        }
    }

    fn resolver(&self) -> MonitorResolver<'_> {
        MonitorResolver::new(&*self.platform, self.platform.dpi_scale(self.handle))
    }

    fn resolve_monitor(&self, pending: Option<DeviceRect>) -> Option<MonitorInfo> {
        self.resolver().resolve(self.handle, pending)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the configuration and re-apply whatever changed.
    pub fn update_config(&self, config: ChromeConfig) -> AppliedEffects {
        if !self.state.get().is_attached() {
            return AppliedEffects::NONE;
        }

        let mut effects = self.config.borrow().diff(&config);
        let glow_config = config.glow.clone();
        let corner_grip = config.corner_grip;
        *self.config.borrow_mut() = config.clone();
        if effects.is_empty() {
            // Fields without a visible effect still take hold
            self.glow.set_config(glow_config, corner_grip);
            return effects;
        }

        if effects.contains(AppliedEffects::MAXIMIZE_ROUNDTRIP) && !self.query_state().is_maximized() {
            effects.remove(AppliedEffects::MAXIMIZE_ROUNDTRIP);
            effects.insert(AppliedEffects::FRAME_CHANGED);
        }
        tracing::debug!(target: targets::INTERCEPTOR, window = ?self.handle, ?effects, "configuration updated");

        let _batch = self.glow.defer_changes();
        if effects.contains(AppliedEffects::STYLE) {
            self.apply_style_bits(&config);
        }
        if effects.contains(AppliedEffects::CORNER_PREFERENCE) {
            self.apply_corner_preference(&config);
        }
        if effects.contains(AppliedEffects::BORDER_THICKNESS) {
            self.refresh_border_thickness();
        }
        self.glow.set_config(glow_config, corner_grip);
        if effects.contains(AppliedEffects::FRAME_CHANGED) {
            self.refresh_frame();
        }
        if effects.contains(AppliedEffects::MAXIMIZE_ROUNDTRIP) {
            self.maximize_roundtrip();
        }
        effects
    }

    /// Ask the OS to recalculate the non-client frame.
    pub fn refresh_frame(&self) {
        let update = WindowPosUpdate::new(self.handle, WindowPos::frame_changed());
        if let Err(err) = self.platform.set_window_pos(update) {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "frame refresh failed");
        }
    }

    /// Restore and maximize again so the OS recomputes the maximized frame.
    fn maximize_roundtrip(&self) {
        tracing::debug!(target: targets::INTERCEPTOR, window = ?self.handle, "re-maximizing to apply taskbar setting");
        if let Err(err) = self.platform.set_window_state(self.handle, WindowState::Normal) {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "restore failed");
            return;
        }
        if let Err(err) = self.platform.set_window_state(self.handle, WindowState::Maximized) {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "maximize failed");
        }
    }

    fn apply_style_bits(&self, config: &ChromeConfig) {
        let style = self.platform.window_style(self.handle);
        let updated = style
            .toggled(WindowStyle::MINIMIZE_BOX, config.enable_minimize)
            .toggled(WindowStyle::MAXIMIZE_BOX, config.enable_maximize);
        if updated != style
            && let Err(err) = self.platform.set_window_style(self.handle, updated)
        {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "style update failed");
        }
    }

    fn apply_corner_preference(&self, config: &ChromeConfig) {
        if let Err(err) = self
            .platform
            .set_corner_preference(self.handle, config.corner_preference)
        {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "corner preference rejected");
        }
    }

    fn refresh_border_thickness(&self) {
        let thickness = self.effective_border_thickness();
        if self.border_thickness.replace(thickness) != thickness {
            tracing::trace!(target: targets::INTERCEPTOR, ?thickness, "border thickness changed");
            self.host.border_thickness_changed(thickness);
        }
    }

    // =========================================================================
    // Host Notifications
    // =========================================================================

    /// The host's resize mode changed.
    pub fn on_resize_mode_changed(&self) {
        self.glow.set_resize_enabled(self.host.resize_mode().allows_resize());
    }

    /// The host observed a window state change.
    pub fn on_state_changed(&self) {
        if self.state.get().is_attached() {
            self.sync_state();
        }
    }

    /// The host window was activated or deactivated.
    pub fn on_activated(&self, active: bool) {
        if self.state.get().is_attached() {
            self.glow.set_active(active);
        }
    }

    /// Defer glow updates while the guard is alive.
    pub fn batch_glow_changes(&self) -> GlowDeferGuard<'_> {
        self.glow.defer_changes()
    }

    // =========================================================================
    // System Commands
    // =========================================================================

    fn command_bridge(&self, config: &ChromeConfig) -> SystemCommandBridge<'_> {
        SystemCommandBridge::new(
            &*self.platform,
            self.handle,
            self.query_state(),
            config,
            self.host.resize_mode().allows_resize(),
        )
    }

    /// Post a system command, for custom caption buttons.
    ///
    /// Returns `Ok(false)` when the command is disabled.
    pub fn post_system_command(&self, command: SystemCommand) -> ChromeResult<bool> {
        if !self.state.get().is_attached() {
            return Err(ChromeError::Detached);
        }
        let config = self.config();
        self.command_bridge(&config).post(command)
    }

    /// Open the system menu at `point` (screen, device pixels).
    pub fn show_system_menu(&self, point: DevicePoint) -> ChromeResult<Option<SystemCommand>> {
        if !self.state.get().is_attached() {
            return Err(ChromeError::Detached);
        }
        let config = self.config();
        self.command_bridge(&config).show_menu(point)
    }

    // =========================================================================
    // Message Dispatch
    // =========================================================================

    /// Handle one message for the main window.
    #[tracing::instrument(skip(self), target = "horizon_chrome::interceptor", level = "trace", fields(window = ?self.handle))]
    pub fn handle(&self, message: ChromeMessage) -> Reply {
        if !self.state.get().is_attached() {
            return Reply::Unhandled;
        }

        match message {
            ChromeMessage::NcCalcSize { proposed } => self.on_nc_calc_size(proposed),
            ChromeMessage::NcHitTest { point } => self.on_nc_hit_test(point),
            ChromeMessage::WindowPosChanging { pos } => self.on_window_pos_changing(pos),
            ChromeMessage::WindowPosChanged { pos } => self.on_window_pos_changed(pos),
            ChromeMessage::GetMinMaxInfo { info } => self.on_get_min_max_info(info),
            ChromeMessage::StyleChanging { old, new } => self.on_style_changing(old, new),
            ChromeMessage::Size { kind } => {
                tracing::trace!(target: targets::INTERCEPTOR, ?kind, "size");
                self.sync_state();
                Reply::Unhandled
            }
            ChromeMessage::EraseBackground => self.on_erase_background(),
            ChromeMessage::Paint => {
                self.painted.set(true);
                Reply::Unhandled
            }
            ChromeMessage::NcActivate { active } => self.on_nc_activate(active),
            ChromeMessage::Activate { active } => {
                self.glow.set_active(active);
                Reply::Unhandled
            }
            ChromeMessage::EnterSizeMove => {
                self.dragging.set(true);
                Reply::Unhandled
            }
            ChromeMessage::ExitSizeMove => {
                self.dragging.set(false);
                self.glow.update_position();
                Reply::Unhandled
            }
            ChromeMessage::NcMouseMove { point } => match self.local_point(point) {
                Some(local) if self.tracker.hover(local).is_some() => Reply::Handled,
                _ => Reply::Unhandled,
            },
            ChromeMessage::NcMouseLeave => {
                self.tracker.clear_hover();
                Reply::Unhandled
            }
            ChromeMessage::NcLeftButtonDown { point } => match self.local_point(point) {
                Some(local) if self.tracker.press(local) => Reply::Handled,
                _ => Reply::Unhandled,
            },
            ChromeMessage::NcLeftButtonUp { point } => self.on_nc_left_button_up(point),
            ChromeMessage::NcRightButtonUp { point } => self.on_nc_right_button_up(point),
            ChromeMessage::CaptionTextOrIconChanged => Reply::DefaultWithoutRedraw,
            ChromeMessage::DpiChanged { scale, suggested } => self.on_dpi_changed(scale, suggested),
            ChromeMessage::ShowWindow { visible } => {
                self.glow.update_visibility(visible);
                Reply::Unhandled
            }
            ChromeMessage::Timer => {
                self.timers.process_expired();
                if let Some(next) = self.timers.time_until_next() {
                    self.platform.request_wakeup(self.handle, next);
                }
                Reply::Handled
            }
            ChromeMessage::Destroy => {
                self.detach();
                Reply::Unhandled
            }
        }
    }

    /// Handle a message for one of this window's glow windows.
    pub fn handle_glow_message(&self, window: WindowHandle, message: GlowMessage) -> Option<Reply> {
        self.glow.handle_message(window, message)
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn on_nc_calc_size(&self, proposed: DeviceRect) -> Reply {
        let config = self.config();
        match self.query_state() {
            WindowState::Maximized => match self.resolve_monitor(Some(proposed)) {
                Some(info) => {
                    let client = info.maximized_bounds(config.ignore_taskbar_on_maximize);
                    tracing::trace!(target: targets::INTERCEPTOR, ?client, "maximized client area");
                    Reply::ClientArea(client)
                }
                None => Reply::ClientArea(proposed),
            },
            WindowState::Normal if config.try_to_be_flicker_free => {
                let padding = self.platform.dpi_scale(self.handle).to_device_length(FLICKER_PADDING);
                let mut client = proposed;
                client.bottom += padding;
                Reply::ClientArea(client)
            }
            _ => Reply::ClientArea(proposed),
        }
    }

    /// Window rect, point in logical screen units, and point relative to the window.
    fn logical_geometry(&self, point: DevicePoint) -> Option<(LogicalRect, LogicalPoint, LogicalPoint)> {
        let rect = self.platform.window_rect(self.handle)?;
        let scale = self.platform.dpi_scale(self.handle);
        let window = scale.to_logical_rect(rect);
        let screen = scale.to_logical_point(point);
        let local = LogicalPoint::new(screen.x - window.left, screen.y - window.top);
        Some((window, screen, local))
    }

    fn local_point(&self, point: DevicePoint) -> Option<LogicalPoint> {
        self.logical_geometry(point).map(|(_, _, local)| local)
    }

    /// Classify a screen point the way `NcHitTest` answers it.
    pub fn hit_test(&self, point: DevicePoint) -> HitTestResult {
        let Some((window, screen, local)) = self.logical_geometry(point) else {
            return HitTestResult::Nowhere;
        };

        if let Some(result) = self.tracker.hit_test(local) {
            return result;
        }
        if self.host.is_client_hit_test_visible(local) {
            return HitTestResult::Client;
        }

        let config = self.config();
        NonClientHitTester::new()
            .with_resize_border(config.resize_border)
            .with_corner_grip(config.corner_grip)
            .with_caption_height(config.caption_height)
            .with_resize_mode(self.host.resize_mode())
            .with_flow_direction(self.host.flow_direction())
            .with_resize_enabled(!self.query_state().is_maximized())
            .hit_test(window, screen)
    }

    fn on_nc_hit_test(&self, point: DevicePoint) -> Reply {
        Reply::HitTest(self.hit_test(point))
    }

    fn on_window_pos_changing(&self, pos: WindowPos) -> Reply {
        if self.dragging.get() {
            return Reply::Unhandled;
        }
        // Move-only and z-order-only changes keep their size.
        if pos.flags.contains(PosFlags::NO_SIZE) {
            return Reply::Unhandled;
        }
        let state = self.query_state();
        if state.is_minimized() {
            return Reply::Unhandled;
        }

        let size_only = pos.flags.contains(PosFlags::NO_MOVE);
        let pending = if size_only {
            let Some(current) = self.platform.window_rect(self.handle) else {
                return Reply::Unhandled;
            };
            DeviceRect::from_origin_size(current.origin(), pos.rect.size())
        } else {
            pos.rect
        };
        let Some(info) = self.resolve_monitor(Some(pending)) else {
            return Reply::Unhandled;
        };
        let bounds = if state.is_maximized() {
            info.maximized_bounds(self.config.borrow().ignore_taskbar_on_maximize)
        } else {
            info.monitor_rect
        };

        let clamped = if size_only {
            clamp_size(pos.rect, bounds)
        } else {
            clamp_rect(pos.rect, bounds)
        };
        if clamped == pos.rect {
            return Reply::Unhandled;
        }
        tracing::trace!(target: targets::INTERCEPTOR, from = ?pos.rect, to = ?clamped, "clamped position");
        Reply::WindowPos(WindowPos {
            rect: clamped,
            ..pos
        })
    }

    fn on_window_pos_changed(&self, pos: WindowPos) -> Reply {
        let state = self.sync_state();
        if state.is_maximized() && pos.moves_or_sizes() {
            self.correct_maximized_position();
        }

        {
            let _batch = self.glow.defer_changes();
            if pos.flags.contains(PosFlags::SHOW_WINDOW) {
                self.glow.update_visibility(true);
            } else if pos.flags.contains(PosFlags::HIDE_WINDOW) {
                self.glow.update_visibility(false);
            }
            self.glow.update_position();
        }

        if pos.changes_z_order() {
            self.glow.update_z_order();
        }
        Reply::Unhandled
    }

    /// Re-apply the resolved monitor bounds after a move while maximized.
    fn correct_maximized_position(&self) {
        let Some(_guard) = ReentrancyGuard::enter(&self.correcting_position) else {
            return;
        };
        let Some(rect) = self.platform.window_rect(self.handle) else {
            return;
        };
        let ignore_taskbar = self.config.borrow().ignore_taskbar_on_maximize;
        let Some(info) = self.resolve_monitor(Some(rect)) else {
            return;
        };

        let bounds = info.maximized_bounds(ignore_taskbar);
        if rect == bounds {
            return;
        }
        tracing::debug!(target: targets::INTERCEPTOR, ?rect, ?bounds, "reasserting maximized bounds");
        let update = WindowPosUpdate::new(self.handle, WindowPos::bounds(bounds));
        if let Err(err) = self.platform.set_window_pos(update) {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "maximized position correction failed");
        }
    }

    fn on_get_min_max_info(&self, mut info: MinMaxInfo) -> Reply {
        if !self.config.borrow().ignore_taskbar_on_maximize {
            return Reply::Unhandled;
        }
        let rect = self.platform.window_rect(self.handle);
        let Some(monitor) = self.resolve_monitor(rect) else {
            return Reply::Unhandled;
        };

        let full = monitor.monitor_rect;
        // Zoomed position is relative to the monitor origin.
        info.max_position = DevicePoint::new(0, 0);
        info.max_size = full.size();
        info.max_track_size = DeviceSize::new(
            info.max_track_size.width.max(full.width()),
            info.max_track_size.height.max(full.height()),
        );
        tracing::trace!(target: targets::INTERCEPTOR, ?info, "zoom to full monitor");
        Reply::MinMaxInfo(info)
    }

    fn on_style_changing(&self, old: WindowStyle, new: WindowStyle) -> Reply {
        if !self.query_state().is_maximized() || !self.config.borrow().ignore_taskbar_on_maximize {
            return Reply::Unhandled;
        }
        let forced = new.without(WindowStyle::POPUP);
        if forced == new {
            return Reply::Unhandled;
        }
        tracing::trace!(target: targets::INTERCEPTOR, ?old, ?new, ?forced, "forcing overlapped style");
        Reply::Style(forced)
    }

    fn on_erase_background(&self) -> Reply {
        if self.painted.get() || self.background_erased.replace(true) {
            return Reply::Unhandled;
        }
        let color = self.platform.color_scheme().background();
        match self.platform.fill_background(self.handle, color) {
            Ok(()) => Reply::BackgroundErased,
            Err(err) => {
                tracing::warn!(target: targets::INTERCEPTOR, %err, "background fill failed");
                Reply::Unhandled
            }
        }
    }

    fn on_nc_activate(&self, active: bool) -> Reply {
        let changed = self.nc_active.replace(active) != active;
        if !active {
            self.tracker.clear();
        }
        if changed {
            tracing::debug!(target: targets::INTERCEPTOR, active, "non-client activation changed");
            self.host.nc_active_changed(active);
        }
        self.glow.set_active(active);
        Reply::SuppressNcRepaint
    }

    fn on_nc_left_button_up(&self, point: DevicePoint) -> Reply {
        let Some(local) = self.local_point(point) else {
            return Reply::Unhandled;
        };
        match self.tracker.click(local) {
            ClickOutcome::Ignored => Reply::Unhandled,
            ClickOutcome::Handled(_) => Reply::Handled,
            ClickOutcome::Passive(region) => {
                if let Some(command) = SystemCommand::for_button(region, self.query_state())
                    && let Err(err) = self.post_system_command(command)
                {
                    tracing::warn!(target: targets::INTERCEPTOR, ?command, %err, "caption button command failed");
                }
                Reply::Handled
            }
        }
    }

    fn on_nc_right_button_up(&self, point: DevicePoint) -> Reply {
        if self.hit_test(point) != HitTestResult::Caption {
            return Reply::Unhandled;
        }
        if let Err(err) = self.show_system_menu(point) {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "system menu failed");
        }
        Reply::Handled
    }

    fn on_dpi_changed(&self, scale: horizon_chrome_core::DpiScale, suggested: DeviceRect) -> Reply {
        tracing::debug!(target: targets::INTERCEPTOR, scale = scale.factor(), ?suggested, "dpi changed");
        let _batch = self.glow.defer_changes();
        let update = WindowPosUpdate::new(self.handle, WindowPos::bounds(suggested));
        if let Err(err) = self.platform.set_window_pos(update) {
            tracing::warn!(target: targets::INTERCEPTOR, %err, "failed to apply suggested rect");
        }
        self.glow.update_position();
        Reply::Handled
    }

    // =========================================================================
    // State Transitions
    // =========================================================================

    /// Re-derive the state from the OS and apply the transition.
    fn sync_state(&self) -> WindowState {
        let state = self.query_state();
        let old = self.state.get();
        let new = ChromeState::from(state);
        if old == new || !old.is_attached() {
            return state;
        }

        self.state.set(new);
        tracing::debug!(target: targets::INTERCEPTOR, window = ?self.handle, ?old, ?new, "window state changed");
        self.refresh_border_thickness();
        self.host.window_state_changed(state);

        let _batch = self.glow.defer_changes();
        self.glow.update_visibility(old == ChromeState::Minimized);
        state
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop intercepting and destroy the glow windows. Idempotent.
    pub fn detach(&self) {
        if self.state.replace(ChromeState::Detached) == ChromeState::Detached {
            tracing::trace!(target: targets::INTERCEPTOR, window = ?self.handle, "already detached");
            return;
        }
        self.tracker.clear();
        self.glow.destroy();
        tracing::debug!(target: targets::INTERCEPTOR, window = ?self.handle, "chrome detached");
    }
}

impl Drop for ChromeWindow {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Move and shrink `rect` to fit inside `bounds`.
fn clamp_rect(rect: DeviceRect, bounds: DeviceRect) -> DeviceRect {
    if bounds.is_empty() {
        return rect;
    }
    let width = rect.width().clamp(0, bounds.width());
    let height = rect.height().clamp(0, bounds.height());
    let left = rect.left.clamp(bounds.left, bounds.right - width);
    let top = rect.top.clamp(bounds.top, bounds.bottom - height);
    DeviceRect::new(left, top, left + width, top + height)
}

/// Shrink `rect` to fit the size of `bounds`, keeping its origin.
fn clamp_size(rect: DeviceRect, bounds: DeviceRect) -> DeviceRect {
    if bounds.is_empty() {
        return rect;
    }
    let size = DeviceSize::new(
        rect.width().clamp(0, bounds.width()),
        rect.height().clamp(0, bounds.height()),
    );
    DeviceRect::from_origin_size(rect.origin(), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::{SimCall, SimPlatform};
    use crate::message::SizeKind;

    fn attach(sim: &Rc<SimPlatform>, config: ChromeConfig) -> Rc<ChromeWindow> {
        let main = sim.create_window(DeviceRect::new(100, 100, 900, 700));
        sim.set_visible(main, true);
        match sim.attach(ChromeWindow::builder().with_config(config), main) {
            Ok(chrome) => chrome,
            Err(err) => panic!("attach failed: {err}"),
        }
    }

    #[test]
    fn test_attach_rejects_null_handle() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let result = ChromeWindow::builder().attach(sim.clone(), 0);
        assert!(matches!(result, Err(ChromeError::InvalidWindowHandle)));

        let result = ChromeWindow::builder().attach(sim, 0xDEAD);
        assert!(matches!(result, Err(ChromeError::InvalidWindowHandle)));
    }

    #[test]
    fn test_clamp_rect() {
        let bounds = DeviceRect::new(0, 0, 1920, 1040);
        assert_eq!(
            clamp_rect(DeviceRect::new(-8, -8, 1928, 1048), bounds),
            bounds
        );
        assert_eq!(
            clamp_rect(DeviceRect::new(1800, 100, 2600, 700), bounds),
            DeviceRect::new(1120, 100, 1920, 700)
        );
        let inside = DeviceRect::new(10, 10, 20, 20);
        assert_eq!(clamp_rect(inside, bounds), inside);
    }

    #[test]
    fn test_clamp_size_keeps_origin() {
        let bounds = DeviceRect::new(0, 0, 1920, 1040);
        assert_eq!(
            clamp_size(DeviceRect::new(300, 200, 2500, 1400), bounds),
            DeviceRect::new(300, 200, 2220, 1240)
        );
        let small = DeviceRect::new(-50, -50, 750, 550);
        assert_eq!(clamp_size(small, bounds), small);
    }

    #[test]
    fn test_normal_client_area_has_flicker_padding() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        let proposed = DeviceRect::new(100, 100, 900, 700);
        assert_eq!(
            chrome.handle(ChromeMessage::NcCalcSize { proposed }),
            Reply::ClientArea(DeviceRect::new(100, 100, 900, 701))
        );

        chrome.update_config(ChromeConfig::default().with_flicker_workaround(false));
        assert_eq!(
            chrome.handle(ChromeMessage::NcCalcSize { proposed }),
            Reply::ClientArea(proposed)
        );
    }

    #[test]
    fn test_hit_test_through_interceptor() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let config = ChromeConfig::default()
            .with_resize_border(Thickness::uniform(5.0))
            .with_corner_grip(10.0)
            .with_caption_height(30.0);
        let chrome = attach(&sim, config);

        let at = |x, y| chrome.handle(ChromeMessage::NcHitTest { point: DevicePoint::new(x, y) });
        assert_eq!(at(103, 103), Reply::HitTest(HitTestResult::TopLeft));
        assert_eq!(at(500, 120), Reply::HitTest(HitTestResult::Caption));
        assert_eq!(at(500, 400), Reply::HitTest(HitTestResult::Client));
        assert_eq!(at(50, 50), Reply::HitTest(HitTestResult::Nowhere));
    }

    #[test]
    fn test_client_visible_content_wins() {
        struct Host;
        impl ChromeHost for Host {
            fn is_client_hit_test_visible(&self, point: LogicalPoint) -> bool {
                point.y < 30.0 && point.x > 100.0 && point.x < 200.0
            }
        }

        let sim = Rc::new(SimPlatform::single_monitor());
        let main = sim.create_window(DeviceRect::new(100, 100, 900, 700));
        let builder = ChromeWindow::builder()
            .with_config(ChromeConfig::default().with_caption_height(30.0))
            .with_host(Rc::new(Host));
        let Ok(chrome) = sim.attach(builder, main) else {
            panic!("attach failed");
        };

        assert_eq!(chrome.hit_test(DevicePoint::new(250, 115)), HitTestResult::Client);
        assert_eq!(chrome.hit_test(DevicePoint::new(500, 115)), HitTestResult::Caption);
    }

    #[test]
    fn test_erase_background_once() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        assert_eq!(chrome.handle(ChromeMessage::EraseBackground), Reply::BackgroundErased);
        assert_eq!(chrome.handle(ChromeMessage::EraseBackground), Reply::Unhandled);
        assert_eq!(sim.count(|c| matches!(c, SimCall::FillBackground(_))), 1);
    }

    #[test]
    fn test_erase_background_skipped_after_paint() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        chrome.handle(ChromeMessage::Paint);
        assert_eq!(chrome.handle(ChromeMessage::EraseBackground), Reply::Unhandled);
    }

    #[test]
    fn test_nc_activate() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        assert!(!chrome.is_nc_active());
        assert_eq!(
            chrome.handle(ChromeMessage::NcActivate { active: true }),
            Reply::SuppressNcRepaint
        );
        assert!(chrome.is_nc_active());
        assert!(chrome.glow().is_active());
        chrome.handle(ChromeMessage::NcActivate { active: false });
        assert!(!chrome.is_nc_active());
    }

    #[test]
    fn test_caption_text_change_suppresses_redraw() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        assert_eq!(
            chrome.handle(ChromeMessage::CaptionTextOrIconChanged),
            Reply::DefaultWithoutRedraw
        );
    }

    #[test]
    fn test_style_bits_follow_config() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default().with_enable_maximize(false));
        let style = sim.window_style(chrome.window_handle());
        assert!(style.contains(WindowStyle::MINIMIZE_BOX));
        assert!(!style.contains(WindowStyle::MAXIMIZE_BOX));

        let effects = chrome.update_config(ChromeConfig::default());
        assert_eq!(effects, AppliedEffects::STYLE);
        assert!(sim.window_style(chrome.window_handle()).contains(WindowStyle::MAXIMIZE_BOX));
    }

    #[test]
    fn test_identical_config_applies_nothing() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        sim.clear_calls();
        assert_eq!(chrome.update_config(chrome.config()), AppliedEffects::NONE);
        assert!(sim.calls().is_empty());
    }

    #[test]
    fn test_taskbar_toggle_while_normal_only_refreshes_frame() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        let effects = chrome.update_config(ChromeConfig::default().with_ignore_taskbar_on_maximize(true));
        assert_eq!(effects, AppliedEffects::FRAME_CHANGED);
        assert_eq!(sim.count(|c| matches!(c, SimCall::SetWindowState(_))), 0);
    }

    #[test]
    fn test_border_thickness_on_maximize() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default().with_keep_border_on_maximize(false));
        assert_eq!(chrome.effective_border_thickness(), Thickness::uniform(1.0));

        sim.maximize(chrome.window_handle());
        assert_eq!(chrome.state(), ChromeState::Maximized);
        assert_eq!(chrome.effective_border_thickness(), Thickness::ZERO);

        let effects = chrome.update_config(chrome.config().with_keep_border_on_maximize(true));
        assert_eq!(effects, AppliedEffects::BORDER_THICKNESS);
        assert_eq!(chrome.effective_border_thickness(), Thickness::uniform(1.0));
    }

    #[test]
    fn test_size_message_syncs_state() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        sim.set_state_silently(chrome.window_handle(), WindowState::Minimized);
        chrome.handle(ChromeMessage::Size { kind: SizeKind::Minimized });
        assert_eq!(chrome.state(), ChromeState::Minimized);
    }

    #[test]
    fn test_detached_ignores_messages() {
        let sim = Rc::new(SimPlatform::single_monitor());
        let chrome = attach(&sim, ChromeConfig::default());
        chrome.handle(ChromeMessage::Destroy);
        assert_eq!(chrome.state(), ChromeState::Detached);
        assert_eq!(
            chrome.handle(ChromeMessage::NcHitTest { point: DevicePoint::new(103, 103) }),
            Reply::Unhandled
        );
        assert!(matches!(
            chrome.post_system_command(SystemCommand::Close),
            Err(ChromeError::Detached)
        ));
        assert_eq!(
            chrome.update_config(ChromeConfig::default().with_caption_height(10.0)),
            AppliedEffects::NONE
        );
    }
}
