//! System light/dark preference.

use crate::config::Color;
use horizon_chrome_core::logging::targets;

/// The system color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    /// Solid fill for a window that has not painted yet.
    pub fn background(&self) -> Color {
        match self {
            ColorScheme::Light => Color::WHITE,
            ColorScheme::Dark => Color::from_rgb_u32(0x202020),
        }
    }
}

/// Detect the current system color scheme.
///
/// Falls back to light when the preference cannot be read.
#[cfg(feature = "system-theme")]
pub fn system_color_scheme() -> ColorScheme {
    match dark_light::detect() {
        dark_light::Mode::Dark => ColorScheme::Dark,
        dark_light::Mode::Light => ColorScheme::Light,
        dark_light::Mode::Default => {
            tracing::debug!(target: targets::PLATFORM, "no system color scheme, assuming light");
            ColorScheme::Light
        }
    }
}

/// Detect the current system color scheme.
///
/// Without the `system-theme` feature this is always light.
#[cfg(not(feature = "system-theme"))]
pub fn system_color_scheme() -> ColorScheme {
    tracing::trace!(target: targets::PLATFORM, "system-theme disabled, assuming light");
    ColorScheme::Light
}
