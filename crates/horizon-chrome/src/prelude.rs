//! Prelude module for Horizon Chrome.
//!
//! ```
//! use horizon_chrome::prelude::*;
//! ```

// ============================================================================
// Interceptor
// ============================================================================

pub use crate::interceptor::{ChromeHost, ChromeState, ChromeWindow, ChromeWindowBuilder};
pub use crate::message::{ChromeMessage, GlowMessage, Reply};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::config::{AppliedEffects, ChromeConfig, Color, CornerPreference, GlowConfig};

// ============================================================================
// Non-Client Area
// ============================================================================

pub use crate::hit_test::{FlowDirection, HitTestResult, ResizeMode};
pub use crate::system_menu::SystemCommand;
pub use crate::tracker::{ClickStrategy, NonClientControl};

// ============================================================================
// Platform and Geometry
// ============================================================================

pub use crate::platform::WindowPlatform;
pub use horizon_chrome_core::{
    ChromeError, ChromeResult, DevicePoint, DeviceRect, DpiScale, LogicalPoint, LogicalRect,
    Thickness, WindowHandle, WindowState,
};
