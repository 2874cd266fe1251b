//! Per-window chrome configuration.
//!
//! [`ChromeConfig`] replaces per-property change callbacks with a single
//! value that is swapped in as a whole. [`ChromeConfig::diff`] reports
//! which physical effects the swap requires as an [`AppliedEffects`] set.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use horizon_chrome_core::Thickness;

use crate::hit_test::NonClientHitTester;

// ============================================================================
// Color
// ============================================================================

/// An opaque-or-translucent 8-bit sRGB color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::from_rgb8(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::from_rgb8(0xFF, 0xFF, 0xFF);

    /// Create a color from 8-bit RGBA components.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from 8-bit RGB components.
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 0xFF)
    }

    /// Create an opaque color from a 24-bit value (0xRRGGBB).
    pub const fn from_rgb_u32(rgb: u32) -> Self {
        Self::from_rgb8(
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        )
    }

    /// Create a color from a hex string (e.g., "#007ACC" or "#007ACCFF").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let len = hex.len();

        if len != 6 && len != 8 {
            return None;
        }

        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        let a = if len == 8 {
            u8::from_str_radix(hex.get(6..8)?, 16).ok()?
        } else {
            0xFF
        };

        Some(Self::from_rgba8(r, g, b, a))
    }

    /// Pack as a native 0x00BBGGRR color reference (alpha dropped).
    pub const fn to_colorref(self) -> u32 {
        (self.r as u32) | ((self.g as u32) << 8) | ((self.b as u32) << 16)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 0xFF {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

// ============================================================================
// Corner Preference
// ============================================================================

/// Rounding of the window's outer corners, painted by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CornerPreference {
    /// Let the platform decide.
    #[default]
    Default,
    /// Never round.
    DoNotRound,
    /// Round with the standard radius.
    Round,
    /// Round with a small radius.
    RoundSmall,
}

// ============================================================================
// Applied Effects
// ============================================================================

/// Set of physical effects a configuration change required.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AppliedEffects(u16);

impl AppliedEffects {
    /// Nothing needed re-applying.
    pub const NONE: AppliedEffects = AppliedEffects(0);
    /// The non-client frame was recalculated.
    pub const FRAME_CHANGED: AppliedEffects = AppliedEffects(1 << 0);
    /// Window style bits (minimize/maximize boxes) were rewritten.
    pub const STYLE: AppliedEffects = AppliedEffects(1 << 1);
    /// The compositor corner preference was re-applied.
    pub const CORNER_PREFERENCE: AppliedEffects = AppliedEffects(1 << 2);
    /// A maximized window was restored and maximized again.
    pub const MAXIMIZE_ROUNDTRIP: AppliedEffects = AppliedEffects(1 << 3);
    /// Glow windows were re-rendered.
    pub const GLOW_APPEARANCE: AppliedEffects = AppliedEffects(1 << 4);
    /// Glow visibility was re-evaluated.
    pub const GLOW_VISIBILITY: AppliedEffects = AppliedEffects(1 << 5);
    /// The native border color was re-applied.
    pub const BORDER_COLOR: AppliedEffects = AppliedEffects(1 << 6);
    /// The effective visual border thickness was recomputed.
    pub const BORDER_THICKNESS: AppliedEffects = AppliedEffects(1 << 7);

    const NAMES: [(AppliedEffects, &'static str); 8] = [
        (Self::FRAME_CHANGED, "FRAME_CHANGED"),
        (Self::STYLE, "STYLE"),
        (Self::CORNER_PREFERENCE, "CORNER_PREFERENCE"),
        (Self::MAXIMIZE_ROUNDTRIP, "MAXIMIZE_ROUNDTRIP"),
        (Self::GLOW_APPEARANCE, "GLOW_APPEARANCE"),
        (Self::GLOW_VISIBILITY, "GLOW_VISIBILITY"),
        (Self::BORDER_COLOR, "BORDER_COLOR"),
        (Self::BORDER_THICKNESS, "BORDER_THICKNESS"),
    ];

    /// Check if every effect in `other` is present.
    pub fn contains(&self, other: AppliedEffects) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no effect is present.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Add the effects in `other`.
    pub fn insert(&mut self, other: AppliedEffects) {
        self.0 |= other.0;
    }

    /// Remove the effects in `other`.
    pub fn remove(&mut self, other: AppliedEffects) {
        self.0 &= !other.0;
    }
}

impl BitOr for AppliedEffects {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        AppliedEffects(self.0 | rhs.0)
    }
}

impl BitOrAssign for AppliedEffects {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AppliedEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Glow Configuration
// ============================================================================

/// Appearance and behavior of the glow windows.
#[derive(Debug, Clone, PartialEq)]
pub struct GlowConfig {
    /// Thickness of each glow window in logical units. Zero disables glow.
    pub depth: u32,
    /// Glow color while the main window is active.
    pub active_color: Color,
    /// Glow color while the main window is inactive.
    pub inactive_color: Color,
    /// Radial (true) or linear (false) gradients at the corners.
    pub use_radial_corners: bool,
    /// Allow the debounced show transition.
    pub transitions_enabled: bool,
    /// Prefer the compositor-painted border over glow windows when available.
    pub prefer_native_border_color: bool,
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            depth: 8,
            active_color: Color::from_rgb_u32(0x007ACC),
            inactive_color: Color::from_rgb_u32(0x999999),
            use_radial_corners: true,
            transitions_enabled: true,
            prefer_native_border_color: true,
        }
    }
}

impl GlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_active_color(mut self, color: Color) -> Self {
        self.active_color = color;
        self
    }

    pub fn with_inactive_color(mut self, color: Color) -> Self {
        self.inactive_color = color;
        self
    }

    pub fn with_radial_corners(mut self, radial: bool) -> Self {
        self.use_radial_corners = radial;
        self
    }

    pub fn with_transitions(mut self, enabled: bool) -> Self {
        self.transitions_enabled = enabled;
        self
    }

    pub fn with_prefer_native_border_color(mut self, prefer: bool) -> Self {
        self.prefer_native_border_color = prefer;
        self
    }

    /// The color for the given activation state.
    pub fn color(&self, active: bool) -> Color {
        if active {
            self.active_color
        } else {
            self.inactive_color
        }
    }

    /// Effects required to move from `self` to `new`.
    pub fn diff(&self, new: &GlowConfig) -> AppliedEffects {
        let mut effects = AppliedEffects::NONE;

        if self.depth != new.depth {
            effects |= AppliedEffects::GLOW_APPEARANCE | AppliedEffects::GLOW_VISIBILITY;
        }
        if self.use_radial_corners != new.use_radial_corners {
            effects |= AppliedEffects::GLOW_APPEARANCE;
        }
        if self.active_color != new.active_color || self.inactive_color != new.inactive_color {
            effects |= AppliedEffects::GLOW_APPEARANCE | AppliedEffects::BORDER_COLOR;
        }
        if self.prefer_native_border_color != new.prefer_native_border_color {
            effects |= AppliedEffects::BORDER_COLOR | AppliedEffects::GLOW_VISIBILITY;
        }
        // transitions_enabled only affects future show transitions

        effects
    }
}

// ============================================================================
// Chrome Configuration
// ============================================================================

/// Configuration for one window's custom chrome.
///
/// # Defaults
///
/// - Resize border: 4 logical units per edge, corner grip 8
/// - Caption height: 0
/// - Visual border thickness: 1, kept when maximized
/// - Taskbar respected on maximize
/// - Minimize and maximize enabled
/// - Flicker workaround on
///
/// # Example
///
/// ```
/// use horizon_chrome::config::{ChromeConfig, CornerPreference};
/// use horizon_chrome_core::Thickness;
///
/// let config = ChromeConfig::new()
///     .with_resize_border(Thickness::uniform(6.0))
///     .with_caption_height(32.0)
///     .with_corner_preference(CornerPreference::Round)
///     .with_ignore_taskbar_on_maximize(true);
/// assert_eq!(config.caption_height, 32.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeConfig {
    /// Resize border thickness per edge, in logical units.
    pub resize_border: Thickness,
    /// Corner grip thickness in logical units.
    pub corner_grip: f64,
    /// Height of the draggable caption band below the top resize border.
    pub caption_height: f64,
    /// Visual border drawn by the host, in logical units.
    pub border_thickness: Thickness,
    /// Maximize to the full monitor instead of the work area.
    pub ignore_taskbar_on_maximize: bool,
    /// Keep the visual border while maximized.
    pub keep_border_on_maximize: bool,
    pub enable_minimize: bool,
    pub enable_maximize: bool,
    pub corner_preference: CornerPreference,
    /// Pad the client rect to dodge resize flicker.
    pub try_to_be_flicker_free: bool,
    pub glow: GlowConfig,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            resize_border: Thickness::uniform(NonClientHitTester::DEFAULT_RESIZE_BORDER),
            corner_grip: NonClientHitTester::DEFAULT_CORNER_GRIP,
            caption_height: 0.0,
            border_thickness: Thickness::uniform(1.0),
            ignore_taskbar_on_maximize: false,
            keep_border_on_maximize: true,
            enable_minimize: true,
            enable_maximize: true,
            corner_preference: CornerPreference::Default,
            try_to_be_flicker_free: true,
            glow: GlowConfig::default(),
        }
    }
}

impl ChromeConfig {
    pub fn new() -> Self {
        Self::default()
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

    pub fn with_border_thickness(mut self, thickness: Thickness) -> Self {
        self.border_thickness = thickness;
        self
    }

    pub fn with_ignore_taskbar_on_maximize(mut self, ignore: bool) -> Self {
        self.ignore_taskbar_on_maximize = ignore;
        self
    }

    pub fn with_keep_border_on_maximize(mut self, keep: bool) -> Self {
        self.keep_border_on_maximize = keep;
        self
    }

    pub fn with_enable_minimize(mut self, enabled: bool) -> Self {
        self.enable_minimize = enabled;
        self
    }

    pub fn with_enable_maximize(mut self, enabled: bool) -> Self {
        self.enable_maximize = enabled;
        self
    }

    pub fn with_corner_preference(mut self, preference: CornerPreference) -> Self {
        self.corner_preference = preference;
        self
    }

    pub fn with_flicker_workaround(mut self, enabled: bool) -> Self {
        self.try_to_be_flicker_free = enabled;
        self
    }

    pub fn with_glow(mut self, glow: GlowConfig) -> Self {
        self.glow = glow;
        self
    }

    // =========================================================================
    // Diffing
    // =========================================================================

    /// Effects required to move from `self` to `new`.
    ///
    /// `MAXIMIZE_ROUNDTRIP` is reported regardless of window state; the
    /// window downgrades it to `FRAME_CHANGED` when it is not maximized.
    pub fn diff(&self, new: &ChromeConfig) -> AppliedEffects {
        let mut effects = AppliedEffects::NONE;

        if self.resize_border != new.resize_border
            || self.corner_grip != new.corner_grip
            || self.caption_height != new.caption_height
            || self.try_to_be_flicker_free != new.try_to_be_flicker_free
        {
            effects |= AppliedEffects::FRAME_CHANGED;
        }
        if self.border_thickness != new.border_thickness
            || self.keep_border_on_maximize != new.keep_border_on_maximize
        {
            effects |= AppliedEffects::BORDER_THICKNESS;
        }
        if self.ignore_taskbar_on_maximize != new.ignore_taskbar_on_maximize {
            effects |= AppliedEffects::MAXIMIZE_ROUNDTRIP;
        }
        if self.enable_minimize != new.enable_minimize
            || self.enable_maximize != new.enable_maximize
        {
            effects |= AppliedEffects::STYLE;
        }
        if self.corner_preference != new.corner_preference {
            effects |= AppliedEffects::CORNER_PREFERENCE;
        }
        if self.corner_grip != new.corner_grip {
            // Glow corner zones follow the grip.
            effects |= AppliedEffects::GLOW_APPEARANCE;
        }

        effects | self.glow.diff(&new.glow)
    }
}
