//! Glow windows: borderless companions that draw a soft border around the
//! main window.
//!
//! One logical window is shown as the main window plus up to four glow
//! windows, one per edge. [`GlowWindowCoordinator`] is the only owner of
//! those windows; it keeps their position, visibility, Z order and
//! appearance in step with the main window.

mod coordinator;
mod placement;

pub use coordinator::{GlowDeferGuard, GlowWindowCoordinator, SHOW_DEBOUNCE};
pub use placement::{glow_rect, resize_region};

use horizon_chrome_core::DeviceSize;

use crate::config::Color;

/// The edge a glow window sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlowEdge {
    Left,
    Top,
    Right,
    Bottom,
}

impl GlowEdge {
    /// All edges in their Z order behind the main window.
    pub const CYCLIC_ORDER: [GlowEdge; 4] =
        [GlowEdge::Left, GlowEdge::Top, GlowEdge::Right, GlowEdge::Bottom];

    /// Slot index in the glow window set.
    pub fn index(&self) -> usize {
        match self {
            GlowEdge::Left => 0,
            GlowEdge::Top => 1,
            GlowEdge::Right => 2,
            GlowEdge::Bottom => 3,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, GlowEdge::Top | GlowEdge::Bottom)
    }
}

/// Everything a renderer needs to draw one glow window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlowAppearance {
    pub edge: GlowEdge,
    /// Size of the glow window in device pixels.
    pub size: DeviceSize,
    /// Glow thickness in device pixels.
    pub depth: i32,
    pub color: Color,
    /// Radial (true) or linear (false) gradients at the corners.
    pub radial_corners: bool,
}
