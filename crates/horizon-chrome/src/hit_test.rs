//! Non-client hit testing for custom window chrome.
//!
//! When the platform's own frame is removed, the OS still asks the window
//! "what is under this point?" to decide cursor shape, dragging and
//! resizing. [`NonClientHitTester`] answers that question for a window
//! rectangle and a point, both in logical units.
//!
//! # Algorithm
//!
//! The point is classified into a 3×3 grid of rows (top band, middle,
//! bottom band) and columns (left band, middle, right band):
//!
//! 1. The top band spans the top resize border plus the caption height.
//!    Only the part above the top resize border is an actual resize edge;
//!    the rest of the band is caption.
//! 2. Points that land in a middle row or middle column (but not both) are
//!    re-classified against the corner grip thickness, so corners are easy
//!    to grab without widening the straight resize edges.
//! 3. A side-band point inside the caption band that is below the top
//!    resize border resizes horizontally rather than diagonally.
//! 4. With resizing disabled every border zone collapses to client.
//! 5. Right-to-left flow mirrors the horizontal classification.
//!
//! # Usage
//!
//! ```
//! use horizon_chrome::hit_test::{HitTestResult, NonClientHitTester};
//! use horizon_chrome_core::{LogicalPoint, LogicalRect, Thickness};
//!
//! let tester = NonClientHitTester::new()
//!     .with_resize_border(Thickness::uniform(5.0))
//!     .with_corner_grip(10.0);
//!
//! let window = LogicalRect::from_xywh(100.0, 100.0, 800.0, 600.0);
//! let result = tester.hit_test(window, LogicalPoint::new(103.0, 103.0));
//! assert_eq!(result, HitTestResult::TopLeft);
//! ```

use cursor_icon::CursorIcon;
use horizon_chrome_core::{LogicalPoint, LogicalRect, Thickness};

/// Re-export of winit's ResizeDirection for convenience.
pub use winit::window::ResizeDirection;

/// Symbolic region of a window under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTestResult {
    /// The point is outside the window.
    Nowhere,
    /// Application content; handle as a normal mouse event.
    Client,
    /// Draggable caption area.
    Caption,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Custom minimize button.
    MinimizeButton,
    /// Custom maximize/restore button.
    MaximizeButton,
    /// Custom close button.
    CloseButton,
}

/// Grid lookup indexed by `[row][column]`.
const BORDER_GRID: [[HitTestResult; 3]; 3] = [
    [
        HitTestResult::TopLeft,
        HitTestResult::Top,
        HitTestResult::TopRight,
    ],
    [
        HitTestResult::Left,
        HitTestResult::Client,
        HitTestResult::Right,
    ],
    [
        HitTestResult::BottomLeft,
        HitTestResult::Bottom,
        HitTestResult::BottomRight,
    ],
];

impl HitTestResult {
    /// Check if this result indicates a resize operation.
    pub fn is_resize(&self) -> bool {
        self.resize_direction().is_some()
    }

    /// Check if this result indicates a draggable area.
    pub fn is_draggable(&self) -> bool {
        matches!(self, Self::Caption)
    }

    /// Check if this result is a caption button.
    pub fn is_button(&self) -> bool {
        matches!(
            self,
            Self::MinimizeButton | Self::MaximizeButton | Self::CloseButton
        )
    }

    /// The resize direction for border and corner regions.
    pub fn resize_direction(&self) -> Option<ResizeDirection> {
        match self {
            Self::Left => Some(ResizeDirection::West),
            Self::Right => Some(ResizeDirection::East),
            Self::Top => Some(ResizeDirection::North),
            Self::Bottom => Some(ResizeDirection::South),
            Self::TopLeft => Some(ResizeDirection::NorthWest),
            Self::TopRight => Some(ResizeDirection::NorthEast),
            Self::BottomLeft => Some(ResizeDirection::SouthWest),
            Self::BottomRight => Some(ResizeDirection::SouthEast),
            _ => None,
        }
    }

    /// Swap left and right.
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::TopLeft => Self::TopRight,
            Self::TopRight => Self::TopLeft,
            Self::BottomLeft => Self::BottomRight,
            Self::BottomRight => Self::BottomLeft,
            other => *other,
        }
    }

    /// The cursor that should be displayed over this region.
    pub fn cursor(&self) -> CursorIcon {
        match self.resize_direction() {
            Some(ResizeDirection::North | ResizeDirection::South) => CursorIcon::NsResize,
            Some(ResizeDirection::East | ResizeDirection::West) => CursorIcon::EwResize,
            Some(ResizeDirection::NorthWest | ResizeDirection::SouthEast) => {
                CursorIcon::NwseResize
            }
            Some(ResizeDirection::NorthEast | ResizeDirection::SouthWest) => {
                CursorIcon::NeswResize
            }
            None => CursorIcon::Default,
        }
    }
}

/// How the host allows the window to be resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Fixed size; no minimize or maximize.
    NoResize,
    /// Fixed size, but can be minimized.
    CanMinimize,
    /// Freely resizable.
    #[default]
    CanResize,
    /// Freely resizable, with a visible grip in the bottom-right corner.
    CanResizeWithGrip,
}

impl ResizeMode {
    /// Check if edge resizing is allowed.
    pub fn allows_resize(&self) -> bool {
        matches!(self, Self::CanResize | Self::CanResizeWithGrip)
    }
}

/// Horizontal flow of the window content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// Pure, stateless non-client hit tester.
///
/// # Defaults
///
/// - Resize border: 4 logical units on every edge
/// - Corner grip: 8 logical units
/// - Caption height: 0 (no caption band below the top resize border)
/// - Resize mode: `CanResize`, flow direction: left-to-right
#[derive(Debug, Clone, PartialEq)]
pub struct NonClientHitTester {
    /// Resize border thickness per edge.
    resize_border: Thickness,
    /// Extent of the forgiving corner zone along each edge.
    corner_grip: f64,
    /// Height of the caption band below the top resize border.
    caption_height: f64,
    resize_mode: ResizeMode,
    flow_direction: FlowDirection,
    /// Cleared while the window is maximized.
    resize_enabled: bool,
}

impl Default for NonClientHitTester {
    fn default() -> Self {
        Self::new()
    }
}

impl NonClientHitTester {
    /// Default resize border thickness in logical units.
    pub const DEFAULT_RESIZE_BORDER: f64 = 4.0;
    /// Default corner grip thickness in logical units.
    pub const DEFAULT_CORNER_GRIP: f64 = 8.0;

    pub fn new() -> Self {
        Self {
            resize_border: Thickness::uniform(Self::DEFAULT_RESIZE_BORDER),
            corner_grip: Self::DEFAULT_CORNER_GRIP,
            caption_height: 0.0,
            resize_mode: ResizeMode::CanResize,
            flow_direction: FlowDirection::LeftToRight,
            resize_enabled: true,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_resize_border(mut self, border: Thickness) -> Self {
        self.resize_border = border;
        self
    }

    pub fn with_corner_grip(mut self, grip: f64) -> Self {
        self.corner_grip = grip.max(0.0);
        self
    }

    pub fn with_caption_height(mut self, height: f64) -> Self {
        self.caption_height = height.max(0.0);
        self
    }

    pub fn with_resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    pub fn with_flow_direction(mut self, direction: FlowDirection) -> Self {
        self.flow_direction = direction;
        self
    }

    /// Enable or disable resizing independently of the resize mode
    /// (maximized windows cannot be resized).
    pub fn with_resize_enabled(mut self, enabled: bool) -> Self {
        self.resize_enabled = enabled;
        self
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn resize_border(&self) -> Thickness {
        self.resize_border
    }

    pub fn corner_grip(&self) -> f64 {
        self.corner_grip
    }

    pub fn caption_height(&self) -> f64 {
        self.caption_height
    }

    /// Check if border zones can resize the window.
    pub fn is_resizable(&self) -> bool {
        self.resize_enabled && self.resize_mode.allows_resize()
    }

    // =========================================================================
    // Hit Testing
    // =========================================================================

    /// Classify `point` against `window`, both in logical screen units.
    pub fn hit_test(&self, window: LogicalRect, point: LogicalPoint) -> HitTestResult {
        if !window.contains(point) {
            return HitTestResult::Nowhere;
        }

        let border = self.resize_border;
        let caption_bottom = window.top + border.top + self.caption_height;

        if !self.is_resizable() {
            return if self.caption_height > 0.0 && point.y < caption_bottom {
                HitTestResult::Caption
            } else {
                HitTestResult::Client
            };
        }

        let (x, y) = (point.x, point.y);
        let mut row = 1;
        let mut col = 1;
        let mut on_resize_border = false;

        if y < caption_bottom {
            on_resize_border = y < window.top + border.top;
            row = 0;
        } else if y >= window.bottom - border.bottom {
            row = 2;
        }

        if x < window.left + border.left {
            col = 0;
        } else if x >= window.right - border.right {
            col = 2;
        }

        // Forgiving corners: extend the corner zone along the edge the
        // point is already on.
        let grip = self.corner_grip;
        if row == 1 && col != 1 {
            if y < window.top + grip {
                row = 0;
                on_resize_border = true;
            } else if y >= window.bottom - grip {
                row = 2;
            }
        } else if col == 1 && (row == 2 || on_resize_border) {
            if x < window.left + grip {
                col = 0;
            } else if x >= window.right - grip {
                col = 2;
            }
        }

        // Beside the caption but below the top resize border: resize
        // horizontally instead of diagonally.
        if row == 0 && col != 1 && !on_resize_border {
            row = 1;
        }

        let mut result = BORDER_GRID[row][col];
        if result == HitTestResult::Top && !on_resize_border {
            result = HitTestResult::Caption;
        }

        if self.flow_direction == FlowDirection::RightToLeft {
            result = result.mirrored();
        }

        tracing::trace!(
            target: horizon_chrome_core::logging::targets::HIT_TEST,
            x, y, row, col, ?result,
            "hit test"
        );
        result
    }
}

/// Classify a point with an explicit parameter list.
///
/// Equivalent to building a [`NonClientHitTester`] with these settings and
/// no caption band.
pub fn hit_test(
    window: LogicalRect,
    point: LogicalPoint,
    resize_border: Thickness,
    corner_grip: f64,
    resize_mode: ResizeMode,
    flow_direction: FlowDirection,
) -> HitTestResult {
    NonClientHitTester::new()
        .with_resize_border(resize_border)
        .with_corner_grip(corner_grip)
        .with_resize_mode(resize_mode)
        .with_flow_direction(flow_direction)
        .hit_test(window, point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> LogicalRect {
        LogicalRect::from_xywh(0.0, 0.0, 800.0, 600.0)
    }

    fn tester() -> NonClientHitTester {
        NonClientHitTester::new()
            .with_resize_border(Thickness::uniform(5.0))
            .with_corner_grip(10.0)
    }

    fn at(tester: &NonClientHitTester, x: f64, y: f64) -> HitTestResult {
        tester.hit_test(window(), LogicalPoint::new(x, y))
    }

    #[test]
    fn test_default_tester() {
        let tester = NonClientHitTester::new();
        assert_eq!(tester.resize_border(), Thickness::uniform(4.0));
        assert_eq!(tester.corner_grip(), 8.0);
        assert_eq!(tester.caption_height(), 0.0);
        assert!(tester.is_resizable());
    }

    #[test]
    fn test_outside_is_nowhere() {
        let tester = tester();
        assert_eq!(at(&tester, -1.0, 300.0), HitTestResult::Nowhere);
        assert_eq!(at(&tester, 800.0, 300.0), HitTestResult::Nowhere);
    }

    #[test]
    fn test_edges_inside_resize_border() {
        let tester = tester();
        assert_eq!(at(&tester, 400.0, 2.0), HitTestResult::Top);
        assert_eq!(at(&tester, 400.0, 597.0), HitTestResult::Bottom);
        assert_eq!(at(&tester, 2.0, 300.0), HitTestResult::Left);
        assert_eq!(at(&tester, 797.0, 300.0), HitTestResult::Right);
    }

    #[test]
    fn test_client_beyond_border_and_grip() {
        let tester = tester();
        // More than border + grip from every edge
        assert_eq!(at(&tester, 16.0, 16.0), HitTestResult::Client);
        assert_eq!(at(&tester, 400.0, 300.0), HitTestResult::Client);
        assert_eq!(at(&tester, 783.0, 583.0), HitTestResult::Client);
    }

    #[test]
    fn test_corner_wins_over_single_edge() {
        let tester = tester();
        // 3 units from top and left, edge border 5, grip 10
        assert_eq!(at(&tester, 3.0, 3.0), HitTestResult::TopLeft);
    }

    #[test]
    fn test_corner_grip_extends_beyond_edge_thickness() {
        let tester = tester();
        // On the left edge but 8 units down: within the grip of the top-left corner
        assert_eq!(at(&tester, 2.0, 8.0), HitTestResult::TopLeft);
        // On the top edge but 8 units in
        assert_eq!(at(&tester, 8.0, 2.0), HitTestResult::TopLeft);
        assert_eq!(at(&tester, 792.0, 2.0), HitTestResult::TopRight);
        assert_eq!(at(&tester, 798.0, 592.0), HitTestResult::BottomRight);
        assert_eq!(at(&tester, 8.0, 598.0), HitTestResult::BottomLeft);
        // Just past the grip the straight edge resumes
        assert_eq!(at(&tester, 2.0, 10.0), HitTestResult::Left);
    }

    #[test]
    fn test_caption_band_below_top_resize_border() {
        let tester = tester().with_caption_height(30.0);
        assert_eq!(at(&tester, 400.0, 2.0), HitTestResult::Top);
        assert_eq!(at(&tester, 400.0, 20.0), HitTestResult::Caption);
        // Left edge beside the caption resizes horizontally
        assert_eq!(at(&tester, 2.0, 20.0), HitTestResult::Left);
        // Inside the caption but near the corner horizontally: still caption
        assert_eq!(at(&tester, 8.0, 20.0), HitTestResult::Caption);
        assert_eq!(at(&tester, 400.0, 40.0), HitTestResult::Client);
    }

    #[test]
    fn test_resize_disabled_never_returns_resize() {
        for tester in [
            tester().with_resize_mode(ResizeMode::NoResize),
            tester().with_resize_mode(ResizeMode::CanMinimize),
            tester().with_resize_enabled(false),
        ] {
            for x in [0.0, 2.0, 8.0, 400.0, 792.0, 799.0] {
                for y in [0.0, 2.0, 8.0, 300.0, 592.0, 599.0] {
                    let result = at(&tester, x, y);
                    assert!(!result.is_resize(), "{x},{y} -> {result:?}");
                }
            }
        }
    }

    #[test]
    fn test_resize_disabled_keeps_caption() {
        let tester = tester()
            .with_caption_height(30.0)
            .with_resize_enabled(false);
        assert_eq!(at(&tester, 2.0, 2.0), HitTestResult::Caption);
        assert_eq!(at(&tester, 400.0, 20.0), HitTestResult::Caption);
        assert_eq!(at(&tester, 400.0, 300.0), HitTestResult::Client);
    }

    #[test]
    fn test_right_to_left_mirrors() {
        let tester = tester().with_flow_direction(FlowDirection::RightToLeft);
        assert_eq!(at(&tester, 2.0, 300.0), HitTestResult::Right);
        assert_eq!(at(&tester, 3.0, 3.0), HitTestResult::TopRight);
        assert_eq!(at(&tester, 400.0, 2.0), HitTestResult::Top);
    }

    #[test]
    fn test_asymmetric_border() {
        let tester = tester().with_resize_border(Thickness::new(2.0, 6.0, 12.0, 1.0));
        assert_eq!(at(&tester, 3.0, 300.0), HitTestResult::Client);
        assert_eq!(at(&tester, 789.0, 300.0), HitTestResult::Right);
        assert_eq!(at(&tester, 400.0, 5.0), HitTestResult::Top);
        assert_eq!(at(&tester, 400.0, 598.0), HitTestResult::Client);
    }

    #[test]
    fn test_free_function_matches_tester() {
        let result = hit_test(
            LogicalRect::from_xywh(100.0, 100.0, 800.0, 600.0),
            LogicalPoint::new(103.0, 103.0),
            Thickness::uniform(5.0),
            10.0,
            ResizeMode::CanResize,
            FlowDirection::LeftToRight,
        );
        assert_eq!(result, HitTestResult::TopLeft);
    }

    #[test]
    fn test_result_helpers() {
        assert!(HitTestResult::TopLeft.is_resize());
        assert!(!HitTestResult::Caption.is_resize());
        assert!(HitTestResult::Caption.is_draggable());
        assert!(HitTestResult::CloseButton.is_button());
        assert!(!HitTestResult::Client.is_button());
        assert_eq!(HitTestResult::Top.cursor(), CursorIcon::NsResize);
        assert_eq!(HitTestResult::BottomLeft.cursor(), CursorIcon::NeswResize);
        assert_eq!(HitTestResult::Caption.cursor(), CursorIcon::Default);
    }
}
