//! Device and logical geometry.
//!
//! The OS speaks in device pixels (`i32`, origin at the primary monitor's
//! top-left, edges exclusive on the right/bottom). Configuration and hit
//! testing are expressed in logical units so they survive DPI changes.
//! [`DpiScale`] converts between the two.

use winit::dpi::{LogicalPosition, PhysicalPosition, PhysicalSize};

// ============================================================================
// Device Geometry
// ============================================================================

/// A point in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

impl DevicePoint {
    /// Create a new device point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<PhysicalPosition<i32>> for DevicePoint {
    fn from(p: PhysicalPosition<i32>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<DevicePoint> for PhysicalPosition<i32> {
    fn from(p: DevicePoint) -> Self {
        PhysicalPosition::new(p.x, p.y)
    }
}

/// A size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceSize {
    pub width: i32,
    pub height: i32,
}

impl DeviceSize {
    /// Create a new device size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl From<PhysicalSize<u32>> for DeviceSize {
    fn from(s: PhysicalSize<u32>) -> Self {
        Self::new(s.width as i32, s.height as i32)
    }
}

/// A rectangle in device pixels, stored as edges.
///
/// `right` and `bottom` are exclusive, so `width = right - left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl DeviceRect {
    /// Create a rectangle from its four edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from an origin and a size.
    pub const fn from_origin_size(origin: DevicePoint, size: DeviceSize) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x + size.width,
            origin.y + size.height,
        )
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn origin(&self) -> DevicePoint {
        DevicePoint::new(self.left, self.top)
    }

    pub fn size(&self) -> DeviceSize {
        DeviceSize::new(self.width(), self.height())
    }

    /// Area in square pixels; zero for empty rectangles.
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    /// Check if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Check if a point lies inside the rectangle (right/bottom exclusive).
    pub fn contains(&self, point: DevicePoint) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Intersection of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &DeviceRect) -> Option<DeviceRect> {
        let r = DeviceRect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union(&self, other: &DeviceRect) -> DeviceRect {
        DeviceRect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Translate the rectangle.
    pub fn offset(&self, dx: i32, dy: i32) -> DeviceRect {
        DeviceRect::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Move the rectangle so its top-left corner is at `origin`.
    pub fn with_origin(&self, origin: DevicePoint) -> DeviceRect {
        DeviceRect::from_origin_size(origin, self.size())
    }

    /// Squared pixel distance between the closest pixels of two rectangles.
    ///
    /// Zero when the rectangles overlap.
    pub fn distance_sq(&self, other: &DeviceRect) -> i64 {
        let dx = (other.left - self.right + 1)
            .max(self.left - other.right + 1)
            .max(0) as i64;
        let dy = (other.top - self.bottom + 1)
            .max(self.top - other.bottom + 1)
            .max(0) as i64;
        dx * dx + dy * dy
    }
}

// ============================================================================
// Logical Geometry
// ============================================================================

/// A point in logical (DPI independent) units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

impl LogicalPoint {
    /// Create a new logical point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<LogicalPosition<f64>> for LogicalPoint {
    fn from(p: LogicalPosition<f64>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<LogicalPoint> for LogicalPosition<f64> {
    fn from(p: LogicalPoint) -> Self {
        LogicalPosition::new(p.x, p.y)
    }
}

/// A rectangle in logical units, stored as edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl LogicalRect {
    /// Create a rectangle from its four edges.
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from position and size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Check if a point lies inside the rectangle (right/bottom exclusive).
    pub fn contains(&self, point: LogicalPoint) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Check if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }
}

/// Per-edge thickness in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Thickness {
    /// Zero thickness on every edge.
    pub const ZERO: Thickness = Thickness::new(0.0, 0.0, 0.0, 0.0);

    /// Create a thickness with distinct values per edge.
    ///
    /// Negative values are clamped to zero.
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: if left > 0.0 { left } else { 0.0 },
            top: if top > 0.0 { top } else { 0.0 },
            right: if right > 0.0 { right } else { 0.0 },
            bottom: if bottom > 0.0 { bottom } else { 0.0 },
        }
    }

    /// Create a thickness with the same value on every edge.
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Check if every edge is zero.
    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }

    /// Swap left and right, for right-to-left flow.
    pub fn mirrored(&self) -> Thickness {
        Thickness::new(self.right, self.top, self.left, self.bottom)
    }
}

// ============================================================================
// DPI Scale
// ============================================================================

/// Ratio of device pixels to logical units for one window or monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpiScale(f64);

impl Default for DpiScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DpiScale {
    /// 96 DPI, one device pixel per logical unit.
    pub const IDENTITY: DpiScale = DpiScale(1.0);

    /// The DPI value that corresponds to a scale of 1.0.
    pub const BASE_DPI: u32 = 96;

    /// Create a scale from a factor. Non-finite or non-positive factors
    /// fall back to 1.0.
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self(factor)
        } else {
            Self::IDENTITY
        }
    }

    /// Create a scale from a DPI value (96 = 100%).
    pub fn from_dpi(dpi: u32) -> Self {
        Self::new(dpi as f64 / Self::BASE_DPI as f64)
    }

    pub fn factor(&self) -> f64 {
        self.0
    }

    /// Convert a logical length to whole device pixels.
    pub fn to_device_length(&self, logical: f64) -> i32 {
        (logical * self.0).round() as i32
    }

    /// Convert a device length to logical units.
    pub fn to_logical_length(&self, device: i32) -> f64 {
        device as f64 / self.0
    }

    pub fn to_logical_point(&self, point: DevicePoint) -> LogicalPoint {
        let physical: PhysicalPosition<i32> = point.into();
        physical.to_logical::<f64>(self.0).into()
    }

    pub fn to_device_point(&self, point: LogicalPoint) -> DevicePoint {
        let logical: LogicalPosition<f64> = point.into();
        logical.to_physical::<i32>(self.0).into()
    }

    pub fn to_logical_rect(&self, rect: DeviceRect) -> LogicalRect {
        LogicalRect::new(
            self.to_logical_length(rect.left),
            self.to_logical_length(rect.top),
            self.to_logical_length(rect.right),
            self.to_logical_length(rect.bottom),
        )
    }

    pub fn to_device_rect(&self, rect: LogicalRect) -> DeviceRect {
        DeviceRect::new(
            self.to_device_length(rect.left),
            self.to_device_length(rect.top),
            self.to_device_length(rect.right),
            self.to_device_length(rect.bottom),
        )
    }
}
