//! Glow window geometry.
//!
//! Side glows span the full height of the main window plus the depth at
//! each end, so they cover the corners. Top and bottom glows span only the
//! main window's width. The four rectangles never overlap.

use horizon_chrome_core::{DevicePoint, DeviceRect};

use super::GlowEdge;
use crate::hit_test::HitTestResult;

/// The rectangle of the glow window on `edge` for a main window at `main`.
pub fn glow_rect(edge: GlowEdge, main: DeviceRect, depth: i32) -> DeviceRect {
    let d = depth.max(0);
    match edge {
        GlowEdge::Left => DeviceRect::new(main.left - d, main.top - d, main.left, main.bottom + d),
        GlowEdge::Right => DeviceRect::new(main.right, main.top - d, main.right + d, main.bottom + d),
        GlowEdge::Top => DeviceRect::new(main.left, main.top - d, main.right, main.top),
        GlowEdge::Bottom => DeviceRect::new(main.left, main.bottom, main.right, main.bottom + d),
    }
}

/// The main window resize region for `point` over a glow window.
///
/// `corner` is the length of the diagonal zone at either end of the glow.
pub fn resize_region(edge: GlowEdge, glow: DeviceRect, point: DevicePoint, corner: i32) -> HitTestResult {
    let (near, far) = if edge.is_horizontal() {
        (point.x < glow.left + corner, point.x >= glow.right - corner)
    } else {
        (point.y < glow.top + corner, point.y >= glow.bottom - corner)
    };

    match (edge, near, far) {
        (GlowEdge::Left, true, _) | (GlowEdge::Top, true, _) => HitTestResult::TopLeft,
        (GlowEdge::Left, _, true) | (GlowEdge::Bottom, true, _) => HitTestResult::BottomLeft,
        (GlowEdge::Right, true, _) | (GlowEdge::Top, _, true) => HitTestResult::TopRight,
        (GlowEdge::Right, _, true) | (GlowEdge::Bottom, _, true) => HitTestResult::BottomRight,
        (GlowEdge::Left, ..) => HitTestResult::Left,
        (GlowEdge::Top, ..) => HitTestResult::Top,
        (GlowEdge::Right, ..) => HitTestResult::Right,
        (GlowEdge::Bottom, ..) => HitTestResult::Bottom,
    }
}
