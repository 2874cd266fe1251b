//! Monitor geometry resolution.
//!
//! [`MonitorResolver`] answers "which monitor, and what are its bounds?"
//! for a window. When a pending rectangle is known (the position about to
//! be applied) it is used in preference to the window handle, because the
//! handle's monitor can be stale until the move completes.
//!
//! Results are never cached: the window may change monitors between any
//! two calls.

use horizon_chrome_core::{DeviceRect, DpiScale, MonitorId, WindowHandle};
use horizon_chrome_core::logging::targets;

use crate::platform::WindowPlatform;

/// Auto-hide taskbar reveal strip kept uncovered, in logical units.
pub const AUTO_HIDE_TASKBAR_MARGIN: f64 = 2.0;

/// An edge of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenEdge {
    Left,
    Top,
    Right,
    Bottom,
}

/// Geometry of one monitor, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInfo {
    pub id: MonitorId,
    /// Full monitor rectangle.
    pub monitor_rect: DeviceRect,
    /// Monitor rectangle minus reserved shell UI such as the taskbar.
    pub work_area: DeviceRect,
    pub is_primary: bool,
}

impl MonitorInfo {
    pub fn new(id: MonitorId, monitor_rect: DeviceRect, work_area: DeviceRect) -> Self {
        Self {
            id,
            monitor_rect,
            work_area,
            is_primary: false,
        }
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.is_primary = primary;
        self
    }

    /// The bounds a maximized window should occupy.
    pub fn maximized_bounds(&self, ignore_taskbar: bool) -> DeviceRect {
        if ignore_taskbar {
            self.monitor_rect
        } else {
            self.work_area
        }
    }

    /// Check if the work area covers the whole monitor.
    pub fn work_area_is_full(&self) -> bool {
        self.work_area == self.monitor_rect
    }
}

/// Shrink `work_area` on `edge` so an auto-hide taskbar can still be
/// revealed by moving the pointer to that edge.
pub fn compensate_auto_hide(work_area: DeviceRect, edge: ScreenEdge, scale: DpiScale) -> DeviceRect {
    let margin = scale.to_device_length(AUTO_HIDE_TASKBAR_MARGIN);
    let mut rect = work_area;
    match edge {
        ScreenEdge::Left => rect.left += margin,
        ScreenEdge::Top => rect.top += margin,
        ScreenEdge::Right => rect.right -= margin,
        ScreenEdge::Bottom => rect.bottom -= margin,
    }
    rect
}

/// A fixed set of monitors with the platform's nearest-match rule.
///
/// Used by backends that manage their own monitor list.
#[derive(Debug, Clone, Default)]
pub struct MonitorLayout {
    monitors: Vec<MonitorInfo>,
}

impl MonitorLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, monitor: MonitorInfo) {
        self.monitors.push(monitor);
    }

    pub fn monitors(&self) -> &[MonitorInfo] {
        &self.monitors
    }

    pub fn get(&self, id: MonitorId) -> Option<&MonitorInfo> {
        self.monitors.iter().find(|m| m.id == id)
    }

    pub fn primary(&self) -> Option<&MonitorInfo> {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.first())
    }

    /// The monitor sharing the largest area with `rect`, or the closest
    /// one when `rect` touches no monitor. Ties go to the earlier monitor.
    pub fn nearest(&self, rect: &DeviceRect) -> Option<&MonitorInfo> {
        let mut best: Option<(&MonitorInfo, i64)> = None;
        for monitor in &self.monitors {
            let overlap = monitor
                .monitor_rect
                .intersect(rect)
                .map(|r| r.area())
                .unwrap_or(0);
            if overlap > 0 && best.is_none_or(|(_, area)| overlap > area) {
                best = Some((monitor, overlap));
            }
        }
        if let Some((monitor, _)) = best {
            return Some(monitor);
        }

        self.monitors
            .iter()
            .min_by_key(|m| m.monitor_rect.distance_sq(rect))
    }
}

/// Resolves monitor geometry for a window through the platform.
pub struct MonitorResolver<'a> {
    platform: &'a dyn WindowPlatform,
    scale: DpiScale,
}

impl<'a> MonitorResolver<'a> {
    /// Create a resolver; `scale` converts the auto-hide margin to pixels.
    pub fn new(platform: &'a dyn WindowPlatform, scale: DpiScale) -> Self {
        Self { platform, scale }
    }

    /// Resolve the monitor for `window`, preferring `pending` when given.
    ///
    /// The returned work area is already compensated for an auto-hide
    /// taskbar. Returns `None` (logged) when no monitor can be found.
    pub fn resolve(&self, window: WindowHandle, pending: Option<DeviceRect>) -> Option<MonitorInfo> {
        let monitor = match pending {
            Some(rect) => self
                .platform
                .monitor_from_rect(rect)
                .or_else(|| self.platform.monitor_from_window(window)),
            None => self.platform.monitor_from_window(window),
        };

        let Some(monitor) = monitor else {
            tracing::warn!(target: targets::MONITOR, ?window, ?pending, "no monitor found");
            return None;
        };

        let Some(mut info) = self.platform.monitor_info(monitor) else {
            tracing::warn!(target: targets::MONITOR, ?monitor, "monitor info unavailable");
            return None;
        };

        if info.work_area_is_full()
            && let Some(edge) = self.platform.auto_hide_taskbar_edge(&info)
        {
            info.work_area = compensate_auto_hide(info.work_area, edge, self.scale);
            tracing::trace!(
                target: targets::MONITOR,
                ?edge,
                work_area = ?info.work_area,
                "compensated for auto-hide taskbar"
            );
        }

        tracing::trace!(target: targets::MONITOR, ?info, "monitor resolved");
        Some(info)
    }
}
