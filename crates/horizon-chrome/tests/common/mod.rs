//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::rc::Rc;
use std::time::Duration;

use horizon_chrome::glow::SHOW_DEBOUNCE;
use horizon_chrome::platform::sim::SimPlatform;
use horizon_chrome::{ChromeConfig, ChromeWindow, ChromeWindowBuilder};
use horizon_chrome_core::{DeviceRect, ManualClock, TimerQueue, WindowHandle};
use tracing_subscriber::EnvFilter;

/// The main window's initial rectangle.
pub const MAIN_RECT: DeviceRect = DeviceRect::new(100, 100, 900, 700);

/// Install a test-writer subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A simulated desktop with one visible main window and a manual clock.
pub struct Desktop {
    pub clock: Rc<ManualClock>,
    pub timers: Rc<TimerQueue>,
    pub sim: Rc<SimPlatform>,
    pub main: WindowHandle,
}

impl Desktop {
    pub fn new(sim: SimPlatform) -> Self {
        Self::with_main_rect(sim, MAIN_RECT)
    }

    pub fn with_main_rect(sim: SimPlatform, rect: DeviceRect) -> Self {
        init_tracing();
        let clock = Rc::new(ManualClock::new());
        let timers = Rc::new(TimerQueue::with_clock(clock.clone()));
        let sim = Rc::new(sim);
        let main = sim.create_window(rect);
        sim.set_visible(main, true);
        Self {
            clock,
            timers,
            sim,
            main,
        }
    }

    pub fn builder(&self, config: ChromeConfig) -> ChromeWindowBuilder {
        ChromeWindow::builder()
            .with_config(config)
            .with_timers(self.timers.clone())
    }

    pub fn attach(&self, config: ChromeConfig) -> Rc<ChromeWindow> {
        self.sim
            .attach(self.builder(config), self.main)
            .expect("Failed to attach chrome")
    }

    /// Advance the clock and deliver the wakeup the way the platform would.
    pub fn advance(&self, chrome: &ChromeWindow, by: Duration) {
        self.clock.advance(by);
        chrome.handle(horizon_chrome::ChromeMessage::Timer);
    }

    /// Let any debounced glow show fire.
    pub fn settle(&self, chrome: &ChromeWindow) {
        self.advance(chrome, SHOW_DEBOUNCE);
    }
}
