//! Custom window chrome for borderless top-level windows.
//!
//! Horizon Chrome lets an application draw its own title bar and border
//! while the window keeps native behavior: edge and corner resizing, caption
//! dragging, snap layouts, correct maximize bounds on every monitor, and a
//! soft glow around the frame.
//!
//! - **Interceptor**: [`ChromeWindow`] answers the window's non-client
//!   messages and tracks its Normal / Maximized / Minimized state
//! - **Hit testing**: [`NonClientHitTester`] maps a point to a resize edge,
//!   corner, caption or client region
//! - **Monitors**: [`MonitorResolver`] finds the target monitor and
//!   compensates for auto-hide taskbars
//! - **Glow windows**: [`GlowWindowCoordinator`] keeps four companion
//!   windows in step with the main window
//! - **Caption controls**: [`NonClientControlTracker`] drives hover, press
//!   and click for custom caption buttons
//! - **System menu**: [`SystemCommandBridge`] posts native window commands
//!
//! The OS is reached only through [`WindowPlatform`]. On Windows the
//! `platform::win32` backend implements it; the `testing` feature adds an
//! in-memory desktop under `platform::sim`.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use horizon_chrome::prelude::*;
//! use horizon_chrome::platform::sim::SimPlatform;
//!
//! let sim = Rc::new(SimPlatform::single_monitor());
//! let main = sim.create_window(DeviceRect::new(100, 100, 900, 700));
//!
//! let config = ChromeConfig::new()
//!     .with_caption_height(32.0)
//!     .with_ignore_taskbar_on_maximize(true);
//! let chrome = sim.attach(ChromeWindow::builder().with_config(config), main).unwrap();
//!
//! sim.maximize(main);
//! assert_eq!(chrome.state(), ChromeState::Maximized);
//! assert_eq!(sim.rect(main), Some(DeviceRect::new(0, 0, 1920, 1080)));
//! ```
//!
//! # Threading
//!
//! Everything here is single-threaded and must be used on the thread that
//! owns the window. Handlers are re-entrant: a platform call made while
//! handling one message may deliver another before it returns.

pub mod config;
pub mod glow;
mod guard;
pub mod hit_test;
pub mod interceptor;
pub mod message;
pub mod monitor;
pub mod platform;
pub mod prelude;
pub mod system_menu;
pub mod tracker;

pub use config::{AppliedEffects, ChromeConfig, Color, CornerPreference, GlowConfig};
pub use glow::{GlowAppearance, GlowDeferGuard, GlowEdge, GlowWindowCoordinator};
pub use hit_test::{FlowDirection, HitTestResult, NonClientHitTester, ResizeDirection, ResizeMode};
pub use interceptor::{ChromeHost, ChromeState, ChromeWindow, ChromeWindowBuilder, DefaultHost};
pub use message::{ChromeMessage, GlowMessage, Reply};
pub use monitor::{MonitorInfo, MonitorResolver, ScreenEdge};
pub use platform::{ColorScheme, WindowPlatform, WindowPosUpdate};
pub use system_menu::{SystemCommand, SystemCommandBridge, SystemMenuState};
pub use tracker::{ClickStrategy, NonClientControl, NonClientControlTracker};

pub use horizon_chrome_core::{ChromeError, ChromeResult};
