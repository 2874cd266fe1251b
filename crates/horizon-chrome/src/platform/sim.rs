//! A deterministic in-memory desktop.
//!
//! [`SimPlatform`] keeps window rectangles, placement, visibility and the Z
//! order in memory and records every mutating call. Windows connected to a
//! [`ChromeWindow`] receive the same message sequence the OS would send, so
//! geometry changes re-enter the interceptor synchronously.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use horizon_chrome_core::logging::targets;
use horizon_chrome_core::{
    ChromeError, ChromeResult, DevicePoint, DeviceRect, DeviceSize, DpiScale, MonitorId,
    WindowHandle, WindowState,
};

use super::{ColorScheme, WindowPlatform, WindowPosUpdate};
use crate::config::{Color, CornerPreference};
use crate::glow::{GlowAppearance, GlowEdge};
use crate::hit_test::HitTestResult;
use crate::interceptor::{ChromeWindow, ChromeWindowBuilder};
use crate::message::{
    ChromeMessage, MinMaxInfo, PosFlags, Reply, SizeKind, WindowPos, WindowStyle, ZOrder,
};
use crate::monitor::{MonitorInfo, MonitorLayout, ScreenEdge};
use crate::system_menu::{SystemCommand, SystemMenuState};

/// Where minimized windows are parked.
const MINIMIZED_RECT: DeviceRect = DeviceRect::new(-32000, -32000, -31840, -31972);

/// A recorded platform call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCall {
    SetWindowPos(WindowHandle),
    /// A batched update of this many windows.
    DeferWindowPos(usize),
    SetWindowState(WindowState),
    SetWindowStyle(WindowStyle),
    BeginResize(HitTestResult),
    CreateGlowWindow(GlowEdge),
    DestroyWindow(WindowHandle),
    RenderGlow(WindowHandle),
    FillBackground(Color),
    SetNativeBorderColor(Option<Color>),
    SetCornerPreference(CornerPreference),
    PostSystemCommand(SystemCommand),
    TrackSystemMenu(SystemMenuState),
    RequestWakeup(Duration),
}

#[derive(Debug)]
struct SimWindow {
    rect: DeviceRect,
    /// Rectangle to restore to.
    normal_rect: DeviceRect,
    client_rect: DeviceRect,
    state: WindowState,
    visible: bool,
    owner: Option<WindowHandle>,
    style: WindowStyle,
}

impl SimWindow {
    fn new(rect: DeviceRect, style: WindowStyle) -> Self {
        Self {
            rect,
            normal_rect: rect,
            client_rect: rect,
            state: WindowState::Normal,
            visible: false,
            owner: None,
            style,
        }
    }
}

struct SimState {
    next_handle: u64,
    windows: HashMap<WindowHandle, SimWindow>,
    /// Front to back.
    z_order: Vec<WindowHandle>,
    monitors: MonitorLayout,
    auto_hide: HashMap<MonitorId, ScreenEdge>,
    scale: DpiScale,
    client_area_animation: bool,
    native_border_supported: bool,
    native_border_honored: bool,
    color_scheme: ColorScheme,
    menu_choice: Option<SystemCommand>,
    chrome: HashMap<WindowHandle, Weak<ChromeWindow>>,
    calls: Vec<SimCall>,
}

impl SimState {
    fn restack(&mut self, window: WindowHandle, insert_after: ZOrder) {
        if !self.z_order.contains(&window) {
            return;
        }
        let target = match insert_after {
            ZOrder::Unchanged => return,
            ZOrder::After(after) if after == window => return,
            ZOrder::Top => None,
            ZOrder::After(after) => Some(after),
        };
        self.z_order.retain(|handle| *handle != window);
        let index = target
            .and_then(|after| self.z_order.iter().position(|handle| *handle == after))
            .map_or(0, |index| index + 1);
        self.z_order.insert(index, window);
    }
}

/// In-memory [`WindowPlatform`].
pub struct SimPlatform {
    state: RefCell<SimState>,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SimState {
                next_handle: 0x100,
                windows: HashMap::new(),
                z_order: Vec::new(),
                monitors: MonitorLayout::new(),
                auto_hide: HashMap::new(),
                scale: DpiScale::IDENTITY,
                client_area_animation: true,
                native_border_supported: false,
                native_border_honored: false,
                color_scheme: ColorScheme::Light,
                menu_choice: None,
                chrome: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// One 1920x1080 monitor with a 40 pixel taskbar at the bottom.
    pub fn single_monitor() -> Self {
        let sim = Self::new();
        sim.add_monitor(
            MonitorInfo::new(
                MonitorId(1),
                DeviceRect::new(0, 0, 1920, 1080),
                DeviceRect::new(0, 0, 1920, 1040),
            )
            .with_primary(true),
        );
        sim
    }

    /// [`single_monitor`](Self::single_monitor) plus a 1280x1024 monitor to
    /// its right with a 40 pixel taskbar at the bottom.
    pub fn dual_monitor() -> Self {
        let sim = Self::single_monitor();
        sim.add_monitor(MonitorInfo::new(
            MonitorId(2),
            DeviceRect::new(1920, 0, 3200, 1024),
            DeviceRect::new(1920, 0, 3200, 984),
        ));
        sim
    }

    // =========================================================================
    // Setup
    // =========================================================================

    pub fn add_monitor(&self, monitor: MonitorInfo) {
        self.state.borrow_mut().monitors.push(monitor);
    }

    /// Declare an auto-hide taskbar on `monitor`.
    pub fn set_auto_hide(&self, monitor: MonitorId, edge: ScreenEdge) {
        self.state.borrow_mut().auto_hide.insert(monitor, edge);
    }

    pub fn set_dpi_scale(&self, scale: DpiScale) {
        self.state.borrow_mut().scale = scale;
    }

    pub fn set_client_area_animation(&self, enabled: bool) {
        self.state.borrow_mut().client_area_animation = enabled;
    }

    /// Whether the compositor supports colored borders and whether it
    /// actually honors the request.
    pub fn set_native_border_support(&self, supported: bool, honored: bool) {
        let mut state = self.state.borrow_mut();
        state.native_border_supported = supported;
        state.native_border_honored = honored;
    }

    pub fn set_color_scheme(&self, scheme: ColorScheme) {
        self.state.borrow_mut().color_scheme = scheme;
    }

    /// The command the user picks from the next system menu.
    pub fn set_menu_choice(&self, choice: Option<SystemCommand>) {
        self.state.borrow_mut().menu_choice = choice;
    }

    /// Create a hidden top-level window in front of all others.
    pub fn create_window(&self, rect: DeviceRect) -> WindowHandle {
        self.insert_window(SimWindow::new(rect, WindowStyle::OVERLAPPED_WINDOW))
    }

    fn insert_window(&self, window: SimWindow) -> WindowHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let Some(handle) = WindowHandle::from_raw(state.next_handle) else {
            unreachable!("handles start above zero");
        };
        state.windows.insert(handle, window);
        state.z_order.insert(0, handle);
        handle
    }

    pub fn set_owner(&self, window: WindowHandle, owner: Option<WindowHandle>) {
        if let Some(sim) = self.state.borrow_mut().windows.get_mut(&window) {
            sim.owner = owner;
        }
    }

    /// Route `window`'s messages to `chrome`.
    pub fn connect(&self, chrome: &Rc<ChromeWindow>) {
        self.state
            .borrow_mut()
            .chrome
            .insert(chrome.window_handle(), Rc::downgrade(chrome));
    }

    /// Attach chrome to `window`, connect it and refresh the frame.
    pub fn attach(
        self: &Rc<Self>,
        builder: ChromeWindowBuilder,
        window: WindowHandle,
    ) -> ChromeResult<Rc<ChromeWindow>> {
        let attached = self
            .state
            .borrow()
            .chrome
            .get(&window)
            .and_then(Weak::upgrade)
            .is_some_and(|chrome| chrome.state().is_attached());
        if attached {
            return Err(ChromeError::AlreadyAttached(window.as_raw()));
        }

        let platform: Rc<dyn WindowPlatform> = self.clone();
        let chrome = builder.attach(platform, window.as_raw())?;
        self.connect(&chrome);
        chrome.refresh_frame();
        Ok(chrome)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn rect(&self, window: WindowHandle) -> Option<DeviceRect> {
        self.state.borrow().windows.get(&window).map(|sim| sim.rect)
    }

    /// The client rectangle from the last `NcCalcSize`.
    pub fn client_rect(&self, window: WindowHandle) -> Option<DeviceRect> {
        self.state.borrow().windows.get(&window).map(|sim| sim.client_rect)
    }

    /// `window` followed by the windows directly behind it, up to `len`.
    pub fn chain_below(&self, window: WindowHandle, len: usize) -> Vec<WindowHandle> {
        let state = self.state.borrow();
        let Some(index) = state.z_order.iter().position(|handle| *handle == window) else {
            return Vec::new();
        };
        state.z_order[index..].iter().take(len).copied().collect()
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&SimCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn record(&self, call: SimCall) {
        self.state.borrow_mut().calls.push(call);
    }

    // =========================================================================
    // Silent Mutation
    // =========================================================================

    pub fn set_visible(&self, window: WindowHandle, visible: bool) {
        if let Some(sim) = self.state.borrow_mut().windows.get_mut(&window) {
            sim.visible = visible;
        }
    }

    pub fn move_window_silently(&self, window: WindowHandle, rect: DeviceRect) {
        if let Some(sim) = self.state.borrow_mut().windows.get_mut(&window) {
            sim.rect = rect;
        }
    }

    pub fn set_state_silently(&self, window: WindowHandle, state: WindowState) {
        if let Some(sim) = self.state.borrow_mut().windows.get_mut(&window) {
            sim.state = state;
        }
    }

    // =========================================================================
    // User Actions
    // =========================================================================

    /// Deliver `message` to the chrome connected to `window`.
    pub fn send(&self, window: WindowHandle, message: ChromeMessage) -> Reply {
        let chrome = self.state.borrow().chrome.get(&window).and_then(Weak::upgrade);
        match chrome {
            Some(chrome) => chrome.handle(message),
            None => Reply::Unhandled,
        }
    }

    /// Show `window` the way a show command does.
    pub fn show(&self, window: WindowHandle) {
        self.send(window, ChromeMessage::ShowWindow { visible: true });
        let pos = WindowPos::z_order(ZOrder::Unchanged)
            .with_flags(PosFlags::NO_ZORDER | PosFlags::SHOW_WINDOW);
        let _ = self.apply_pos(window, pos);
    }

    /// Move `window` through the full message sequence.
    pub fn move_window(&self, window: WindowHandle, rect: DeviceRect) {
        let _ = self.apply_pos(window, WindowPos::bounds(rect));
    }

    /// Set the rectangle without `WindowPosChanging`, then report it.
    ///
    /// Mimics the OS placing a maximized window with stale dimensions.
    pub fn force_window_rect(&self, window: WindowHandle, rect: DeviceRect) {
        self.move_window_silently(window, rect);
        self.send(window, ChromeMessage::WindowPosChanged {
            pos: WindowPos::bounds(rect),
        });
    }

    pub fn maximize(&self, window: WindowHandle) {
        let _ = self.set_window_state(window, WindowState::Maximized);
    }

    pub fn minimize(&self, window: WindowHandle) {
        let _ = self.set_window_state(window, WindowState::Minimized);
    }

    pub fn restore(&self, window: WindowHandle) {
        let _ = self.set_window_state(window, WindowState::Normal);
    }

    // =========================================================================
    // Position Pipeline
    // =========================================================================

    fn normalize(mut pos: WindowPos, current: DeviceRect) -> WindowPos {
        let origin = if pos.flags.contains(PosFlags::NO_MOVE) {
            current.origin()
        } else {
            pos.rect.origin()
        };
        let size = if pos.flags.contains(PosFlags::NO_SIZE) {
            current.size()
        } else {
            pos.rect.size()
        };
        pos.rect = DeviceRect::from_origin_size(origin, size);
        pos
    }

    /// Apply a position the way the OS does: changing, apply, frame
    /// calculation, changed.
    fn apply_pos(&self, window: WindowHandle, pos: WindowPos) -> ChromeResult<()> {
        let Some(current) = self.rect(window) else {
            return Err(ChromeError::platform("set_window_pos", "no such window"));
        };

        let mut pos = Self::normalize(pos, current);
        if let Reply::WindowPos(changed) = self.send(window, ChromeMessage::WindowPosChanging { pos }) {
            pos = Self::normalize(changed, current);
        }

        {
            let mut state = self.state.borrow_mut();
            let Some(sim) = state.windows.get_mut(&window) else {
                return Err(ChromeError::platform("set_window_pos", "window destroyed"));
            };
            sim.rect = pos.rect;
            if sim.state.is_normal() {
                sim.normal_rect = pos.rect;
            }
            if pos.flags.contains(PosFlags::SHOW_WINDOW) {
                sim.visible = true;
            } else if pos.flags.contains(PosFlags::HIDE_WINDOW) {
                sim.visible = false;
            }
            if pos.changes_z_order() {
                state.restack(window, pos.insert_after);
            }
        }

        if pos.rect != current || pos.flags.contains(PosFlags::FRAME_CHANGED) {
            let client = match self.send(window, ChromeMessage::NcCalcSize { proposed: pos.rect }) {
                Reply::ClientArea(client) => client,
                _ => pos.rect,
            };
            if let Some(sim) = self.state.borrow_mut().windows.get_mut(&window) {
                sim.client_rect = client;
            }
        }

        self.send(window, ChromeMessage::WindowPosChanged { pos });

        // Owned windows follow their owner in the Z order.
        if pos.changes_z_order() {
            let owned: Vec<WindowHandle> = {
                let state = self.state.borrow();
                state
                    .windows
                    .iter()
                    .filter(|(_, sim)| sim.owner == Some(window))
                    .map(|(handle, _)| *handle)
                    .collect()
            };
            for handle in owned {
                let pos = WindowPos::z_order(ZOrder::Unchanged);
                self.send(handle, ChromeMessage::WindowPosChanged { pos });
            }
        }
        Ok(())
    }

    fn nearest_monitor(&self, rect: DeviceRect) -> Option<MonitorInfo> {
        self.state.borrow().monitors.nearest(&rect).copied()
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowPlatform for SimPlatform {
    fn is_window(&self, window: WindowHandle) -> bool {
        self.state.borrow().windows.contains_key(&window)
    }

    fn window_rect(&self, window: WindowHandle) -> Option<DeviceRect> {
        self.rect(window)
    }

    fn window_state(&self, window: WindowHandle) -> Option<WindowState> {
        self.state.borrow().windows.get(&window).map(|sim| sim.state)
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        self.state.borrow().windows.get(&window).is_some_and(|sim| sim.visible)
    }

    fn dpi_scale(&self, _window: WindowHandle) -> DpiScale {
        self.state.borrow().scale
    }

    fn owner(&self, window: WindowHandle) -> Option<WindowHandle> {
        self.state.borrow().windows.get(&window).and_then(|sim| sim.owner)
    }

    fn window_style(&self, window: WindowHandle) -> WindowStyle {
        self.state
            .borrow()
            .windows
            .get(&window)
            .map_or(WindowStyle::NONE, |sim| sim.style)
    }

    fn set_window_style(&self, window: WindowHandle, style: WindowStyle) -> ChromeResult<()> {
        if !self.is_window(window) {
            return Err(ChromeError::platform("set_window_style", "no such window"));
        }
        let old = self.window_style(window);
        let style = match self.send(window, ChromeMessage::StyleChanging { old, new: style }) {
            Reply::Style(forced) => forced,
            _ => style,
        };
        self.record(SimCall::SetWindowStyle(style));
        if let Some(sim) = self.state.borrow_mut().windows.get_mut(&window) {
            sim.style = style;
        }
        Ok(())
    }

    fn set_window_pos(&self, update: WindowPosUpdate) -> ChromeResult<()> {
        self.record(SimCall::SetWindowPos(update.window));
        self.apply_pos(update.window, update.pos)
    }

    fn defer_window_pos(&self, updates: &[WindowPosUpdate]) -> ChromeResult<()> {
        self.record(SimCall::DeferWindowPos(updates.len()));
        for update in updates {
            self.apply_pos(update.window, update.pos)?;
        }
        Ok(())
    }

    fn set_window_state(&self, window: WindowHandle, target: WindowState) -> ChromeResult<()> {
        self.record(SimCall::SetWindowState(target));
        let (current, rect, normal_rect) = {
            let state = self.state.borrow();
            let Some(sim) = state.windows.get(&window) else {
                return Err(ChromeError::platform("set_window_state", "no such window"));
            };
            (sim.state, sim.rect, sim.normal_rect)
        };
        if current == target {
            return Ok(());
        }

        let (bounds, kind) = match target {
            WindowState::Maximized => {
                let Some(monitor) = self.nearest_monitor(rect) else {
                    return Err(ChromeError::platform("set_window_state", "no monitor"));
                };
                let full = monitor.monitor_rect;
                let work = monitor.work_area;
                let default = MinMaxInfo {
                    max_position: DevicePoint::new(work.left - full.left, work.top - full.top),
                    max_size: work.size(),
                    min_track_size: DeviceSize::new(0, 0),
                    max_track_size: full.size(),
                };
                let info = match self.send(window, ChromeMessage::GetMinMaxInfo { info: default }) {
                    Reply::MinMaxInfo(info) => info,
                    _ => default,
                };
                let origin = DevicePoint::new(
                    full.left + info.max_position.x,
                    full.top + info.max_position.y,
                );
                (DeviceRect::from_origin_size(origin, info.max_size), SizeKind::Maximized)
            }
            WindowState::Minimized => (MINIMIZED_RECT, SizeKind::Minimized),
            WindowState::Normal => (normal_rect, SizeKind::Restored),
        };

        self.set_state_silently(window, target);
        tracing::trace!(target: targets::PLATFORM, ?window, ?target, ?bounds, "sim placement change");
        self.apply_pos(window, WindowPos::bounds(bounds).with_flags(PosFlags::FRAME_CHANGED))?;
        self.send(window, ChromeMessage::Size { kind });
        Ok(())
    }

    fn begin_resize(&self, window: WindowHandle, region: HitTestResult) -> ChromeResult<()> {
        if !self.is_window(window) {
            return Err(ChromeError::platform("begin_resize", "no such window"));
        }
        self.record(SimCall::BeginResize(region));
        Ok(())
    }

    fn monitor_from_rect(&self, rect: DeviceRect) -> Option<MonitorId> {
        self.nearest_monitor(rect).map(|monitor| monitor.id)
    }

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorId> {
        self.monitor_from_rect(self.rect(window)?)
    }

    fn monitor_info(&self, monitor: MonitorId) -> Option<MonitorInfo> {
        self.state.borrow().monitors.get(monitor).copied()
    }

    fn auto_hide_taskbar_edge(&self, monitor: &MonitorInfo) -> Option<ScreenEdge> {
        self.state.borrow().auto_hide.get(&monitor.id).copied()
    }

    fn client_area_animation(&self) -> bool {
        self.state.borrow().client_area_animation
    }

    fn color_scheme(&self) -> ColorScheme {
        self.state.borrow().color_scheme
    }

    fn fill_background(&self, window: WindowHandle, color: Color) -> ChromeResult<()> {
        if !self.is_window(window) {
            return Err(ChromeError::platform("fill_background", "no such window"));
        }
        self.record(SimCall::FillBackground(color));
        Ok(())
    }

    fn supports_native_border_color(&self) -> bool {
        self.state.borrow().native_border_supported
    }

    fn set_native_border_color(&self, _window: WindowHandle, color: Option<Color>) -> bool {
        self.record(SimCall::SetNativeBorderColor(color));
        let state = self.state.borrow();
        color.is_none() || (state.native_border_supported && state.native_border_honored)
    }

    fn set_corner_preference(
        &self,
        _window: WindowHandle,
        preference: CornerPreference,
    ) -> ChromeResult<()> {
        self.record(SimCall::SetCornerPreference(preference));
        Ok(())
    }

    fn create_glow_window(&self, owner: WindowHandle, edge: GlowEdge) -> ChromeResult<WindowHandle> {
        if !self.is_window(owner) {
            return Err(ChromeError::platform("create_glow_window", "owner is not a window"));
        }
        self.record(SimCall::CreateGlowWindow(edge));
        let mut window = SimWindow::new(DeviceRect::default(), WindowStyle::POPUP);
        window.owner = Some(owner);
        Ok(self.insert_window(window))
    }

    fn destroy_window(&self, window: WindowHandle) -> ChromeResult<()> {
        self.record(SimCall::DestroyWindow(window));
        let mut state = self.state.borrow_mut();
        if state.windows.remove(&window).is_none() {
            return Err(ChromeError::platform("destroy_window", "no such window"));
        }
        state.z_order.retain(|handle| *handle != window);
        state.chrome.remove(&window);
        Ok(())
    }

    fn render_glow(&self, window: WindowHandle, _appearance: &GlowAppearance) -> ChromeResult<()> {
        if !self.is_window(window) {
            return Err(ChromeError::platform("render_glow", "no such window"));
        }
        self.record(SimCall::RenderGlow(window));
        Ok(())
    }

    fn post_system_command(&self, _window: WindowHandle, command: SystemCommand) -> ChromeResult<()> {
        self.record(SimCall::PostSystemCommand(command));
        Ok(())
    }

    fn track_system_menu(
        &self,
        _window: WindowHandle,
        _point: DevicePoint,
        state: &SystemMenuState,
    ) -> Option<SystemCommand> {
        self.record(SimCall::TrackSystemMenu(*state));
        self.state
            .borrow()
            .menu_choice
            .filter(|command| state.allows(*command))
    }

    fn request_wakeup(&self, _window: WindowHandle, after: Duration) {
        self.record(SimCall::RequestWakeup(after));
    }
}
