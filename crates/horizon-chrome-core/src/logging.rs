//! Tracing targets used throughout Horizon Chrome.
//!
//! Horizon Chrome uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in the host
//! application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_chrome=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_chrome_core";
    /// One-shot timer queue.
    pub const TIMER: &str = "horizon_chrome_core::timer";
    /// Deferral scopes.
    pub const DEFER: &str = "horizon_chrome_core::defer";
    /// Message interceptor and window state machine.
    pub const INTERCEPTOR: &str = "horizon_chrome::interceptor";
    /// Non-client hit testing.
    pub const HIT_TEST: &str = "horizon_chrome::hit_test";
    /// Monitor resolution.
    pub const MONITOR: &str = "horizon_chrome::monitor";
    /// Glow window coordination.
    pub const GLOW: &str = "horizon_chrome::glow";
    /// Non-client control tracking.
    pub const TRACKER: &str = "horizon_chrome::tracker";
    /// System menu and commands.
    pub const SYSTEM_MENU: &str = "horizon_chrome::system_menu";
    /// Native platform backend.
    pub const PLATFORM: &str = "horizon_chrome::platform";
}
