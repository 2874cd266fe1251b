//! Error types for Horizon Chrome.

use thiserror::Error;

/// The main error type for chrome operations.
///
/// Only contract violations and hard platform failures surface through this
/// type. Transient query failures (no monitor for a rectangle, unreadable
/// theme settings) are absorbed where they occur and logged instead.
#[derive(Error, Debug)]
pub enum ChromeError {
    /// Attach was attempted without a live native window handle.
    #[error("no valid native window handle is available for attach")]
    InvalidWindowHandle,

    /// The window already has a chrome interceptor attached.
    #[error("window {0:#x} already has chrome attached")]
    AlreadyAttached(u64),

    /// The operation requires an attached window.
    #[error("chrome is detached from its window")]
    Detached,

    /// A native platform call failed.
    #[error("platform call `{operation}` failed: {message}")]
    Platform {
        /// The platform operation that failed.
        operation: &'static str,
        /// The platform-provided failure description.
        message: String,
    },
}

impl ChromeError {
    /// Create a platform error for the given operation.
    pub fn platform(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Platform {
            operation,
            message: message.into(),
        }
    }

    /// Returns true if this error is a programming contract violation.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::InvalidWindowHandle | Self::AlreadyAttached(_))
    }
}

/// Timer-specific errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid, has already fired, or was cancelled.
    #[error("invalid or expired timer id")]
    InvalidTimerId,
}

/// A specialized Result type for chrome operations.
pub type ChromeResult<T> = std::result::Result<T, ChromeError>;
