//! Core primitives for Horizon Chrome.
//!
//! This crate provides the platform-neutral building blocks used by the
//! custom window chrome subsystem:
//!
//! - **Geometry**: device (physical pixel) and logical (DPI independent)
//!   points, sizes and rectangles, plus the [`DpiScale`] that converts between them
//! - **Window identity**: the opaque [`WindowHandle`], [`MonitorId`] and the
//!   OS-derived [`WindowState`]
//! - **Timers**: a single-threaded one-shot [`TimerQueue`] driven by the host's
//!   message loop, with an injectable [`Clock`]
//! - **Deferral**: the reference-counted [`DeferScope`] used to batch
//!   multi-window repositioning
//! - **Errors and logging**: [`ChromeError`] and the tracing target names
//!
//! # Example
//!
//! ```
//! use horizon_chrome_core::{DeviceRect, DpiScale};
//!
//! let scale = DpiScale::new(1.5);
//! let device = DeviceRect::new(0, 0, 1920, 1080);
//! let logical = scale.to_logical_rect(device);
//! assert_eq!(logical.width(), 1280.0);
//! assert_eq!(scale.to_device_rect(logical), device);
//! ```

mod defer;
mod error;
mod geometry;
pub mod logging;
mod timer;
mod window;

pub use defer::{DeferExit, DeferScope};
pub use error::{ChromeError, ChromeResult, TimerError};
pub use geometry::{
    DevicePoint, DeviceRect, DeviceSize, DpiScale, LogicalPoint, LogicalRect, Thickness,
};
pub use timer::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};
pub use window::{MonitorId, WindowHandle, WindowState};
