//! Lifecycle, placement, visibility and Z order of the glow windows.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use horizon_chrome_core::logging::targets;
use horizon_chrome_core::{
    DeferExit, DeferScope, DevicePoint, DeviceRect, TimerId, TimerQueue, WindowHandle,
    WindowState,
};

use super::placement::{glow_rect, resize_region};
use super::{GlowAppearance, GlowEdge};
use crate::config::{AppliedEffects, GlowConfig};
use crate::guard::ReentrancyGuard;
use crate::hit_test::HitTestResult;
use crate::message::{GlowMessage, PosFlags, Reply, WindowPos, ZOrder};
use crate::platform::{WindowPlatform, WindowPosUpdate};

/// Delay before glow windows appear after a show transition.
pub const SHOW_DEBOUNCE: Duration = Duration::from_millis(200);

/// One glow window and what was last pushed to the platform for it.
#[derive(Debug)]
struct GlowWindow {
    handle: WindowHandle,
    edge: GlowEdge,
    /// Rectangle and visibility last applied.
    applied: Option<(DeviceRect, bool)>,
    /// Appearance last rendered.
    rendered: Option<GlowAppearance>,
}

impl GlowWindow {
    fn new(handle: WindowHandle, edge: GlowEdge) -> Self {
        Self {
            handle,
            edge,
            applied: None,
            rendered: None,
        }
    }

    fn is_shown(&self) -> bool {
        matches!(self.applied, Some((_, true)))
    }
}

/// Owns the glow windows of one main window.
///
/// All changes funnel through a single commit step. While a
/// [`GlowDeferGuard`] is alive the commit is postponed, and the outermost
/// guard's drop issues one batched multi-window update.
pub struct GlowWindowCoordinator {
    main: WindowHandle,
    platform: Rc<dyn WindowPlatform>,
    timers: Rc<TimerQueue>,
    this: Weak<GlowWindowCoordinator>,
    slots: RefCell<[Option<GlowWindow>; 4]>,
    config: RefCell<GlowConfig>,
    corner_grip: Cell<f64>,
    resize_enabled: Cell<bool>,
    active: Cell<bool>,
    /// Glow windows are logically shown.
    visible: Cell<bool>,
    native_border_active: Cell<bool>,
    pending_show: Cell<Option<TimerId>>,
    defer: DeferScope,
    commit_pending: Cell<bool>,
    updating_z_order: Cell<bool>,
    destroyed: Cell<bool>,
}

impl fmt::Debug for GlowWindowCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowWindowCoordinator")
            .field("main", &self.main)
            .field("visible", &self.visible.get())
            .field("active", &self.active.get())
            .field("native_border_active", &self.native_border_active.get())
            .field("pending_show", &self.pending_show.get())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

impl GlowWindowCoordinator {
    /// Create a coordinator for `main`. No glow window exists until one is
    /// first needed.
    pub fn new(
        main: WindowHandle,
        platform: Rc<dyn WindowPlatform>,
        timers: Rc<TimerQueue>,
        config: GlowConfig,
        corner_grip: f64,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            main,
            platform,
            timers,
            this: this.clone(),
            slots: RefCell::new([None, None, None, None]),
            config: RefCell::new(config),
            corner_grip: Cell::new(corner_grip),
            resize_enabled: Cell::new(true),
            active: Cell::new(false),
            visible: Cell::new(false),
            native_border_active: Cell::new(false),
            pending_show: Cell::new(None),
            defer: DeferScope::new(),
            commit_pending: Cell::new(false),
            updating_z_order: Cell::new(false),
            destroyed: Cell::new(false),
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn main_window(&self) -> WindowHandle {
        self.main
    }

    /// Check if the glow windows are logically shown.
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Check if the compositor is painting the border instead of glow windows.
    pub fn is_native_border_active(&self) -> bool {
        self.native_border_active.get()
    }

    /// Check if a delayed show is waiting on the timer queue.
    pub fn has_pending_show(&self) -> bool {
        self.pending_show.get().is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn is_deferring(&self) -> bool {
        self.defer.is_deferring()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn is_glow_window(&self, window: WindowHandle) -> bool {
        self.slots
            .borrow()
            .iter()
            .flatten()
            .any(|glow| glow.handle == window)
    }

    /// Handles of every created glow window, in cyclic order.
    pub fn window_handles(&self) -> Vec<WindowHandle> {
        self.slots.borrow().iter().flatten().map(|glow| glow.handle).collect()
    }

    /// Handles of the glow windows currently shown, in cyclic order.
    pub fn visible_handles(&self) -> Vec<WindowHandle> {
        self.slots
            .borrow()
            .iter()
            .flatten()
            .filter(|glow| glow.is_shown())
            .map(|glow| glow.handle)
            .collect()
    }

    /// The glow window for `edge`, if created.
    pub fn handle_for(&self, edge: GlowEdge) -> Option<WindowHandle> {
        self.slots.borrow()[edge.index()].as_ref().map(|glow| glow.handle)
    }

    pub fn config(&self) -> GlowConfig {
        self.config.borrow().clone()
    }

    // =========================================================================
    // Batching
    // =========================================================================

    /// Postpone physical updates until the returned guard (and every guard
    /// opened inside it) is dropped.
    pub fn defer_changes(&self) -> GlowDeferGuard<'_> {
        let depth = self.defer.enter();
        tracing::trace!(target: targets::GLOW, depth, "glow updates deferred");
        GlowDeferGuard { coordinator: self }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Replace the glow configuration.
    pub fn set_config(&self, config: GlowConfig, corner_grip: f64) -> AppliedEffects {
        let effects = self.config.borrow().diff(&config);
        *self.config.borrow_mut() = config;
        self.corner_grip.set(corner_grip);
        if effects.is_empty() {
            return effects;
        }

        let _batch = self.defer_changes();
        if effects.contains(AppliedEffects::BORDER_COLOR) {
            self.refresh_native_border();
        }
        if effects.contains(AppliedEffects::GLOW_VISIBILITY) {
            self.update_visibility(false);
        }
        self.commit();
        effects
    }

    /// The main window gained or lost activation.
    pub fn set_active(&self, active: bool) {
        if self.active.replace(active) == active {
            return;
        }
        tracing::trace!(target: targets::GLOW, active, "glow activation changed");
        if self.native_border_active.get() {
            self.refresh_native_border();
        }
        self.commit();
    }

    /// Whether the host currently allows edge resizing.
    pub fn set_resize_enabled(&self, enabled: bool) {
        if self.resize_enabled.replace(enabled) != enabled {
            self.update_visibility(false);
        }
    }

    /// Decide between the compositor border and glow windows.
    ///
    /// The compositor border is used when it is supported, preferred and
    /// actually honored; otherwise glow windows take over.
    pub fn refresh_native_border(&self) {
        if self.destroyed.get() {
            return;
        }
        let (prefer, color) = {
            let config = self.config.borrow();
            (config.prefer_native_border_color, config.color(self.active.get()))
        };

        let was_active = self.native_border_active.get();
        let now_active = if prefer && self.platform.supports_native_border_color() {
            let honored = self.platform.set_native_border_color(self.main, Some(color));
            if !honored {
                tracing::warn!(
                    target: targets::GLOW,
                    window = ?self.main,
                    "native border color ignored, falling back to glow windows"
                );
            }
            honored
        } else {
            if was_active {
                self.platform.set_native_border_color(self.main, None);
            }
            false
        };

        self.native_border_active.set(now_active);
        if was_active != now_active {
            tracing::debug!(target: targets::GLOW, native = now_active, "border treatment changed");
            self.update_visibility(false);
        }
    }

    /// The main window moved or resized.
    pub fn update_position(&self) {
        self.commit();
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Check if glow windows should be shown right now.
    pub fn should_show(&self) -> bool {
        if self.destroyed.get() {
            return false;
        }
        if self.config.borrow().depth == 0
            || self.native_border_active.get()
            || !self.resize_enabled.get()
        {
            return false;
        }
        if !self.platform.is_visible(self.main) {
            return false;
        }
        matches!(self.platform.window_state(self.main), Some(WindowState::Normal))
    }

    /// Re-evaluate visibility.
    ///
    /// Showing is debounced by [`SHOW_DEBOUNCE`] when `delay_acceptable`,
    /// transitions are enabled and client-area animations are on. Hiding is
    /// always immediate. Any pending delayed show is restarted.
    pub fn update_visibility(&self, delay_acceptable: bool) {
        if self.destroyed.get() {
            return;
        }
        self.cancel_pending_show();

        if !self.should_show() {
            self.set_visible(false);
            return;
        }
        if self.visible.get() {
            self.commit();
            return;
        }

        let transitions = self.config.borrow().transitions_enabled;
        if delay_acceptable && transitions && self.platform.client_area_animation() {
            let this = self.this.clone();
            let id = self.timers.schedule_once(SHOW_DEBOUNCE, move || {
                if let Some(coordinator) = this.upgrade() {
                    coordinator.on_show_timer();
                }
            });
            self.pending_show.set(Some(id));
            self.platform.request_wakeup(self.main, SHOW_DEBOUNCE);
            tracing::trace!(target: targets::GLOW, ?id, "glow show debounced");
        } else {
            self.set_visible(true);
        }
    }

    fn on_show_timer(&self) {
        self.pending_show.set(None);
        if self.should_show() {
            self.set_visible(true);
        }
    }

    fn cancel_pending_show(&self) {
        if let Some(id) = self.pending_show.take() {
            // The timer may have fired already
            let _ = self.timers.cancel(id);
        }
    }

    fn set_visible(&self, visible: bool) {
        if self.visible.replace(visible) != visible {
            tracing::debug!(target: targets::GLOW, window = ?self.main, visible, "glow visibility changed");
        }
        if visible {
            self.ensure_created();
        }
        self.commit();
    }

    fn ensure_created(&self) {
        let missing: Vec<GlowEdge> = {
            let slots = self.slots.borrow();
            GlowEdge::CYCLIC_ORDER
                .into_iter()
                .filter(|edge| slots[edge.index()].is_none())
                .collect()
        };

        for edge in missing {
            match self.platform.create_glow_window(self.main, edge) {
                Ok(handle) => {
                    tracing::trace!(target: targets::GLOW, ?edge, ?handle, "glow window created");
                    self.slots.borrow_mut()[edge.index()] = Some(GlowWindow::new(handle, edge));
                }
                Err(err) => {
                    tracing::warn!(target: targets::GLOW, ?edge, %err, "failed to create glow window");
                }
            }
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Push pending geometry, visibility and appearance to the platform.
    fn commit(&self) {
        if self.destroyed.get() {
            return;
        }
        if self.defer.is_deferring() {
            self.commit_pending.set(true);
            return;
        }
        self.commit_pending.set(false);

        let Some(main_rect) = self.platform.window_rect(self.main) else {
            tracing::warn!(target: targets::GLOW, window = ?self.main, "main window rect unavailable");
            return;
        };
        let scale = self.platform.dpi_scale(self.main);
        let (depth, color, radial_corners) = {
            let config = self.config.borrow();
            (
                scale.to_device_length(config.depth as f64),
                config.color(self.active.get()),
                config.use_radial_corners,
            )
        };
        let visible = self.visible.get();

        let mut updates = Vec::new();
        let mut renders = Vec::new();
        let mut showing = false;
        {
            let mut slots = self.slots.borrow_mut();
            for glow in slots.iter_mut().flatten() {
                if !visible && !glow.is_shown() {
                    continue;
                }

                let rect = glow_rect(glow.edge, main_rect, depth);
                if visible {
                    let appearance = GlowAppearance {
                        edge: glow.edge,
                        size: rect.size(),
                        depth,
                        color,
                        radial_corners,
                    };
                    if glow.rendered != Some(appearance) {
                        glow.rendered = Some(appearance);
                        renders.push((glow.handle, appearance));
                    }
                }

                if glow.applied != Some((rect, visible)) {
                    showing |= visible && !glow.is_shown();
                    let visibility = if visible {
                        PosFlags::SHOW_WINDOW
                    } else {
                        PosFlags::HIDE_WINDOW
                    };
                    let pos = WindowPos::bounds(rect).with_flags(visibility);
                    updates.push(WindowPosUpdate::new(glow.handle, pos));
                    glow.applied = Some((rect, visible));
                }
            }
        }

        for (handle, appearance) in renders {
            if let Err(err) = self.platform.render_glow(handle, &appearance) {
                tracing::warn!(target: targets::GLOW, ?handle, %err, "failed to render glow");
            }
        }

        if !updates.is_empty() {
            tracing::trace!(target: targets::GLOW, count = updates.len(), "applying glow positions");
            if let Err(err) = self.platform.defer_window_pos(&updates) {
                tracing::warn!(target: targets::GLOW, %err, "failed to position glow windows");
            }
        }

        if showing {
            self.update_z_order();
        }
    }

    // =========================================================================
    // Z Order
    // =========================================================================

    /// Stack the shown glow windows directly behind the main window in
    /// cyclic order, then the main window's owner behind the last of them.
    pub fn update_z_order(&self) {
        if self.destroyed.get() {
            return;
        }
        let Some(_guard) = ReentrancyGuard::enter(&self.updating_z_order) else {
            tracing::trace!(target: targets::GLOW, "z-order update suppressed while updating");
            return;
        };

        let mut previous = self.main;
        for handle in self.visible_handles() {
            let update = WindowPosUpdate::new(handle, WindowPos::z_order(ZOrder::After(previous)));
            if let Err(err) = self.platform.set_window_pos(update) {
                tracing::warn!(target: targets::GLOW, ?handle, %err, "failed to restack glow window");
            }
            previous = handle;
        }

        if let Some(owner) = self.platform.owner(self.main) {
            let update = WindowPosUpdate::new(owner, WindowPos::z_order(ZOrder::After(previous)));
            if let Err(err) = self.platform.set_window_pos(update) {
                tracing::warn!(target: targets::GLOW, ?owner, %err, "failed to restack owner");
            }
        }
    }

    // =========================================================================
    // Glow Window Messages
    // =========================================================================

    /// Handle a message for one of the glow windows. Returns `None` when
    /// `window` is not one of them.
    pub fn handle_message(&self, window: WindowHandle, message: GlowMessage) -> Option<Reply> {
        let (edge, rect) = {
            let slots = self.slots.borrow();
            let glow = slots.iter().flatten().find(|glow| glow.handle == window)?;
            (glow.edge, glow.applied.map(|(rect, _)| rect))
        };

        let reply = match message {
            GlowMessage::MouseActivate => Reply::NoActivate,
            GlowMessage::NcHitTest { .. } => Reply::HitTest(HitTestResult::Client),
            GlowMessage::SetCursor { point } => match rect {
                Some(rect) => Reply::Cursor(self.region_at(edge, rect, point).cursor()),
                None => Reply::Unhandled,
            },
            GlowMessage::LeftButtonDown { point } => {
                let Some(rect) = rect else {
                    return Some(Reply::Unhandled);
                };
                let region = self.region_at(edge, rect, point);
                tracing::debug!(target: targets::GLOW, ?edge, ?region, "resize from glow window");
                if let Err(err) = self.platform.begin_resize(self.main, region) {
                    tracing::warn!(target: targets::GLOW, %err, "failed to begin resize");
                }
                Reply::Handled
            }
            GlowMessage::Destroyed => {
                self.slots.borrow_mut()[edge.index()] = None;
                tracing::debug!(target: targets::GLOW, ?edge, "glow window destroyed externally");
                Reply::Unhandled
            }
        };
        Some(reply)
    }

    fn region_at(&self, edge: GlowEdge, rect: DeviceRect, point: DevicePoint) -> HitTestResult {
        let scale = self.platform.dpi_scale(self.main);
        let grip = scale.to_device_length(self.corner_grip.get());
        // Side glows overhang the top and bottom glows by their depth.
        let corner = if edge.is_horizontal() {
            grip
        } else {
            grip + scale.to_device_length(self.config.borrow().depth as f64)
        };
        resize_region(edge, rect, point, corner)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Cancel the pending show and destroy every glow window. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.cancel_pending_show();

        let windows: Vec<WindowHandle> = self
            .slots
            .borrow_mut()
            .iter_mut()
            .filter_map(Option::take)
            .map(|glow| glow.handle)
            .collect();

        for handle in &windows {
            if let Err(err) = self.platform.destroy_window(*handle) {
                tracing::warn!(target: targets::GLOW, ?handle, %err, "failed to destroy glow window");
            }
        }
        self.visible.set(false);
        tracing::debug!(target: targets::GLOW, window = ?self.main, count = windows.len(), "glow windows destroyed");
    }
}

/// Keeps glow updates deferred while alive.
#[must_use = "glow updates are only deferred while the guard is alive"]
pub struct GlowDeferGuard<'a> {
    coordinator: &'a GlowWindowCoordinator,
}

impl Drop for GlowDeferGuard<'_> {
    fn drop(&mut self) {
        let coordinator = self.coordinator;
        if coordinator.defer.exit() == DeferExit::Outermost && coordinator.commit_pending.get() {
            tracing::trace!(target: targets::GLOW, "flushing deferred glow updates");
            coordinator.commit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::{SimCall, SimPlatform};
    use horizon_chrome_core::ManualClock;

    struct Fixture {
        clock: Rc<ManualClock>,
        timers: Rc<TimerQueue>,
        sim: Rc<SimPlatform>,
        main: WindowHandle,
        glow: Rc<GlowWindowCoordinator>,
    }

    fn fixture(config: GlowConfig) -> Fixture {
        let clock = Rc::new(ManualClock::new());
        let timers = Rc::new(TimerQueue::with_clock(clock.clone()));
        let sim = Rc::new(SimPlatform::single_monitor());
        let main = sim.create_window(DeviceRect::new(100, 100, 900, 700));
        sim.set_visible(main, true);
        let glow = GlowWindowCoordinator::new(main, sim.clone(), timers.clone(), config, 8.0);
        Fixture {
            clock,
            timers,
            sim,
            main,
            glow,
        }
    }

    #[test]
    fn test_glow_windows_created_lazily() {
        let f = fixture(GlowConfig::default());
        assert!(f.glow.window_handles().is_empty());

        f.glow.update_visibility(false);
        assert!(f.glow.is_visible());
        assert_eq!(f.glow.window_handles().len(), 4);
        assert_eq!(f.glow.visible_handles().len(), 4);
        for handle in f.glow.window_handles() {
            assert!(f.sim.is_visible(handle));
        }
    }

    #[test]
    fn test_glow_rects_follow_main_window() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);

        let Some(left) = f.glow.handle_for(GlowEdge::Left) else {
            panic!("left glow missing");
        };
        assert_eq!(f.sim.rect(left), Some(DeviceRect::new(92, 92, 100, 708)));

        f.sim.move_window_silently(f.main, DeviceRect::new(200, 200, 1000, 800));
        f.glow.update_position();
        assert_eq!(f.sim.rect(left), Some(DeviceRect::new(192, 192, 200, 808)));
    }

    #[test]
    fn test_show_is_debounced() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(true);
        assert!(!f.glow.is_visible());
        assert!(f.glow.has_pending_show());

        f.clock.advance(SHOW_DEBOUNCE - Duration::from_millis(1));
        f.timers.process_expired();
        assert!(!f.glow.is_visible());

        f.clock.advance(Duration::from_millis(1));
        f.timers.process_expired();
        assert!(f.glow.is_visible());
        assert!(!f.glow.has_pending_show());
    }

    #[test]
    fn test_no_debounce_when_animations_reduced() {
        let f = fixture(GlowConfig::default());
        f.sim.set_client_area_animation(false);
        f.glow.update_visibility(true);
        assert!(f.glow.is_visible());
    }

    #[test]
    fn test_no_debounce_without_transitions() {
        let f = fixture(GlowConfig::default().with_transitions(false));
        f.glow.update_visibility(true);
        assert!(f.glow.is_visible());
    }

    #[test]
    fn test_hide_is_immediate_and_cancels_show() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(true);
        assert!(f.glow.has_pending_show());

        f.sim.set_visible(f.main, false);
        f.glow.update_visibility(true);
        assert!(!f.glow.has_pending_show());
        assert!(!f.glow.is_visible());

        f.clock.advance(SHOW_DEBOUNCE);
        assert_eq!(f.timers.process_expired(), 0);
        assert!(!f.glow.is_visible());
    }

    #[test]
    fn test_reaffirm_restarts_debounce() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(true);
        f.clock.advance(Duration::from_millis(150));
        f.glow.update_visibility(true);

        f.clock.advance(Duration::from_millis(100));
        f.timers.process_expired();
        assert!(!f.glow.is_visible());

        f.clock.advance(Duration::from_millis(100));
        f.timers.process_expired();
        assert!(f.glow.is_visible());
    }

    #[test]
    fn test_zero_depth_hides_glow() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        assert!(f.glow.is_visible());

        let effects = f.glow.set_config(GlowConfig::default().with_depth(0), 8.0);
        assert!(effects.contains(AppliedEffects::GLOW_VISIBILITY));
        assert!(!f.glow.is_visible());
        assert!(f.glow.visible_handles().is_empty());
    }

    #[test]
    fn test_resize_disabled_hides_glow() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        f.glow.set_resize_enabled(false);
        assert!(!f.glow.is_visible());
        f.glow.set_resize_enabled(true);
        assert!(f.glow.is_visible());
    }

    #[test]
    fn test_maximized_hides_glow() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        f.sim.set_state_silently(f.main, WindowState::Maximized);
        f.glow.update_visibility(false);
        assert!(!f.glow.is_visible());
    }

    #[test]
    fn test_native_border_excludes_glow() {
        let f = fixture(GlowConfig::default());
        f.sim.set_native_border_support(true, true);
        f.glow.refresh_native_border();
        assert!(f.glow.is_native_border_active());
        f.glow.update_visibility(false);
        assert!(!f.glow.is_visible());
    }

    #[test]
    fn test_ignored_native_border_falls_back_to_glow() {
        let f = fixture(GlowConfig::default());
        f.sim.set_native_border_support(true, false);
        f.glow.refresh_native_border();
        assert!(!f.glow.is_native_border_active());
        f.glow.update_visibility(false);
        assert!(f.glow.is_visible());
    }

    #[test]
    fn test_nested_defer_issues_one_batch() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        f.sim.clear_calls();

        {
            let _outer = f.glow.defer_changes();
            f.sim.move_window_silently(f.main, DeviceRect::new(110, 100, 910, 700));
            f.glow.update_position();
            {
                let _inner = f.glow.defer_changes();
                f.sim.move_window_silently(f.main, DeviceRect::new(120, 100, 920, 700));
                f.glow.update_position();
            }
            assert_eq!(f.sim.count(|c| matches!(c, SimCall::DeferWindowPos(_))), 0);
        }

        assert_eq!(f.sim.count(|c| matches!(c, SimCall::DeferWindowPos(_))), 1);
        assert_eq!(f.sim.count(|c| matches!(c, SimCall::DeferWindowPos(n) if *n == 4)), 1);
    }

    #[test]
    fn test_each_change_applies_immediately_without_defer() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        f.sim.clear_calls();

        f.sim.move_window_silently(f.main, DeviceRect::new(110, 100, 910, 700));
        f.glow.update_position();
        f.sim.move_window_silently(f.main, DeviceRect::new(120, 100, 920, 700));
        f.glow.update_position();
        assert_eq!(f.sim.count(|c| matches!(c, SimCall::DeferWindowPos(_))), 2);
    }

    #[test]
    fn test_rerender_only_on_appearance_change() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        assert_eq!(f.sim.count(|c| matches!(c, SimCall::RenderGlow(_))), 4);

        f.sim.move_window_silently(f.main, DeviceRect::new(150, 150, 950, 750));
        f.glow.update_position();
        assert_eq!(f.sim.count(|c| matches!(c, SimCall::RenderGlow(_))), 4);

        f.glow.set_active(true);
        assert_eq!(f.sim.count(|c| matches!(c, SimCall::RenderGlow(_))), 8);
    }

    #[test]
    fn test_z_order_follows_main() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);

        let mut expected = vec![f.main];
        expected.extend(f.glow.visible_handles());
        let chain = f.sim.chain_below(f.main, 5);
        assert_eq!(chain, expected);
    }

    #[test]
    fn test_glow_messages() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        let Some(left) = f.glow.handle_for(GlowEdge::Left) else {
            panic!("left glow missing");
        };

        assert_eq!(
            f.glow.handle_message(left, GlowMessage::MouseActivate),
            Some(Reply::NoActivate)
        );
        assert_eq!(f.glow.handle_message(f.main, GlowMessage::MouseActivate), None);

        let reply = f.glow.handle_message(left, GlowMessage::LeftButtonDown {
            point: DevicePoint::new(95, 400),
        });
        assert_eq!(reply, Some(Reply::Handled));
        assert_eq!(
            f.sim.count(|c| matches!(c, SimCall::BeginResize(HitTestResult::Left))),
            1
        );
    }

    #[test]
    fn test_glow_corner_zones() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(false);
        let (Some(top), Some(left)) = (f.glow.handle_for(GlowEdge::Top), f.glow.handle_for(GlowEdge::Left))
        else {
            panic!("glow windows missing");
        };
        let cursor_at = |window, x, y| {
            f.glow.handle_message(window, GlowMessage::SetCursor { point: DevicePoint::new(x, y) })
        };

        // Top glow spans 100..900, corner zones are the grip alone.
        assert_eq!(cursor_at(top, 110, 95), Some(Reply::Cursor(HitTestResult::Top.cursor())));
        assert_eq!(cursor_at(top, 105, 95), Some(Reply::Cursor(HitTestResult::TopLeft.cursor())));
        assert_eq!(cursor_at(top, 895, 95), Some(Reply::Cursor(HitTestResult::TopRight.cursor())));

        // Left glow spans 92..708, corner zones include the depth.
        assert_eq!(cursor_at(left, 95, 105), Some(Reply::Cursor(HitTestResult::TopLeft.cursor())));
        assert_eq!(cursor_at(left, 95, 110), Some(Reply::Cursor(HitTestResult::Left.cursor())));
        assert_eq!(cursor_at(left, 95, 700), Some(Reply::Cursor(HitTestResult::BottomLeft.cursor())));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(true);
        f.clock.advance(SHOW_DEBOUNCE);
        f.timers.process_expired();
        assert_eq!(f.glow.window_handles().len(), 4);

        f.glow.destroy();
        f.glow.destroy();
        assert_eq!(f.sim.count(|c| matches!(c, SimCall::DestroyWindow(_))), 4);
        assert!(f.glow.window_handles().is_empty());
        assert!(!f.glow.is_visible());
    }

    #[test]
    fn test_destroy_cancels_pending_show() {
        let f = fixture(GlowConfig::default());
        f.glow.update_visibility(true);
        f.glow.destroy();
        assert_eq!(f.timers.pending_count(), 0);
        f.clock.advance(SHOW_DEBOUNCE);
        assert_eq!(f.timers.process_expired(), 0);
        assert!(f.glow.window_handles().is_empty());
    }
}
