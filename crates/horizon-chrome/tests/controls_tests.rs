//! Tests for caption controls and the system menu.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::Desktop;
use horizon_chrome::platform::sim::{SimCall, SimPlatform};
use horizon_chrome::prelude::*;

/// A caption button drawn by the application.
struct CaptionButton {
    bounds: LogicalRect,
    region: HitTestResult,
    strategy: ClickStrategy,
    enabled: Cell<bool>,
    hovered: Cell<bool>,
    pressed: Cell<bool>,
    clicks: Cell<u32>,
    invoke_supported: bool,
}

impl CaptionButton {
    fn close() -> Rc<Self> {
        Self::with_strategy(ClickStrategy::None, false)
    }

    fn with_strategy(strategy: ClickStrategy, invoke_supported: bool) -> Rc<Self> {
        Rc::new(Self {
            bounds: LogicalRect::new(750.0, 0.0, 800.0, 30.0),
            region: HitTestResult::CloseButton,
            strategy,
            enabled: Cell::new(true),
            hovered: Cell::new(false),
            pressed: Cell::new(false),
            clicks: Cell::new(0),
            invoke_supported,
        })
    }
}

impl NonClientControl for CaptionButton {
    fn bounds(&self) -> LogicalRect {
        self.bounds
    }

    fn hit_test_result(&self) -> HitTestResult {
        self.region
    }

    fn click_strategy(&self) -> ClickStrategy {
        self.strategy
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn set_hovered(&self, hovered: bool) {
        self.hovered.set(hovered);
    }

    fn set_pressed(&self, pressed: bool) {
        self.pressed.set(pressed);
    }

    fn raise_click(&self) {
        self.clicks.set(self.clicks.get() + 1);
    }

    fn invoke(&self) -> bool {
        if self.invoke_supported {
            self.clicks.set(self.clicks.get() + 1);
        }
        self.invoke_supported
    }
}

fn register(chrome: &ChromeWindow, button: &Rc<CaptionButton>) {
    let control: Rc<dyn NonClientControl> = button.clone();
    chrome.tracker().register(&control);
}

fn caption_config() -> ChromeConfig {
    ChromeConfig::new().with_caption_height(30.0)
}

/// Over the button, screen coordinates.
const ON_BUTTON: DevicePoint = DevicePoint::new(875, 115);
/// Over the caption, away from the button.
const ON_CAPTION: DevicePoint = DevicePoint::new(500, 115);

// ============================================================================
// Caption Buttons
// ============================================================================

#[test]
fn test_button_reports_its_region() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::close();
    register(&chrome, &button);

    assert_eq!(
        chrome.handle(ChromeMessage::NcHitTest { point: ON_BUTTON }),
        Reply::HitTest(HitTestResult::CloseButton)
    );
    assert_eq!(
        chrome.handle(ChromeMessage::NcHitTest { point: ON_CAPTION }),
        Reply::HitTest(HitTestResult::Caption)
    );

    button.enabled.set(false);
    assert_eq!(
        chrome.handle(ChromeMessage::NcHitTest { point: ON_BUTTON }),
        Reply::HitTest(HitTestResult::Caption)
    );
}

#[test]
fn test_hover_follows_pointer() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::close();
    register(&chrome, &button);

    assert_eq!(chrome.handle(ChromeMessage::NcMouseMove { point: ON_BUTTON }), Reply::Handled);
    assert!(button.hovered.get());

    assert_eq!(chrome.handle(ChromeMessage::NcMouseMove { point: ON_CAPTION }), Reply::Unhandled);
    assert!(!button.hovered.get());

    chrome.handle(ChromeMessage::NcMouseMove { point: ON_BUTTON });
    chrome.handle(ChromeMessage::NcMouseLeave);
    assert!(!button.hovered.get());
}

#[test]
fn test_click_posts_button_command() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::close();
    register(&chrome, &button);

    assert_eq!(chrome.handle(ChromeMessage::NcLeftButtonDown { point: ON_BUTTON }), Reply::Handled);
    assert!(button.pressed.get());

    assert_eq!(chrome.handle(ChromeMessage::NcLeftButtonUp { point: ON_BUTTON }), Reply::Handled);
    assert!(!button.pressed.get());
    assert_eq!(
        desktop.sim.count(|c| *c == SimCall::PostSystemCommand(SystemCommand::Close)),
        1
    );
}

#[test]
fn test_release_off_button_does_nothing() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::close();
    register(&chrome, &button);

    chrome.handle(ChromeMessage::NcLeftButtonDown { point: ON_BUTTON });
    assert_eq!(chrome.handle(ChromeMessage::NcLeftButtonUp { point: ON_CAPTION }), Reply::Unhandled);
    assert!(!button.pressed.get());
    assert_eq!(desktop.sim.count(|c| matches!(c, SimCall::PostSystemCommand(_))), 0);
}

#[test]
fn test_deactivation_clears_control_state() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::close();
    register(&chrome, &button);

    chrome.handle(ChromeMessage::NcActivate { active: true });
    chrome.handle(ChromeMessage::NcMouseMove { point: ON_BUTTON });
    chrome.handle(ChromeMessage::NcLeftButtonDown { point: ON_BUTTON });
    assert!(button.hovered.get() && button.pressed.get());

    assert_eq!(
        chrome.handle(ChromeMessage::NcActivate { active: false }),
        Reply::SuppressNcRepaint
    );
    assert!(!button.hovered.get());
    assert!(!button.pressed.get());
    assert_eq!(chrome.handle(ChromeMessage::NcLeftButtonUp { point: ON_BUTTON }), Reply::Unhandled);
}

#[test]
fn test_mouse_event_strategy_clicks_control() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::with_strategy(ClickStrategy::MouseEvent, false);
    register(&chrome, &button);

    chrome.handle(ChromeMessage::NcLeftButtonDown { point: ON_BUTTON });
    assert_eq!(chrome.handle(ChromeMessage::NcLeftButtonUp { point: ON_BUTTON }), Reply::Handled);
    assert_eq!(button.clicks.get(), 1);
    assert_eq!(desktop.sim.count(|c| matches!(c, SimCall::PostSystemCommand(_))), 0);
}

#[test]
fn test_invoke_strategy_falls_back_to_click() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let invokable = CaptionButton::with_strategy(ClickStrategy::Invoke, true);
    register(&chrome, &invokable);

    chrome.handle(ChromeMessage::NcLeftButtonDown { point: ON_BUTTON });
    chrome.handle(ChromeMessage::NcLeftButtonUp { point: ON_BUTTON });
    assert_eq!(invokable.clicks.get(), 1);

    let plain = CaptionButton::with_strategy(ClickStrategy::Invoke, false);
    chrome.tracker().unregister(&(invokable.clone() as Rc<dyn NonClientControl>));
    register(&chrome, &plain);

    chrome.handle(ChromeMessage::NcLeftButtonDown { point: ON_BUTTON });
    chrome.handle(ChromeMessage::NcLeftButtonUp { point: ON_BUTTON });
    assert_eq!(plain.clicks.get(), 1);
    assert_eq!(invokable.clicks.get(), 1);
}

#[test]
fn test_dropped_control_is_forgotten() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    let button = CaptionButton::close();
    register(&chrome, &button);
    assert_eq!(chrome.tracker().len(), 1);

    drop(button);
    assert!(chrome.tracker().is_empty());
    assert_eq!(
        chrome.handle(ChromeMessage::NcHitTest { point: ON_BUTTON }),
        Reply::HitTest(HitTestResult::Caption)
    );
}

// ============================================================================
// System Menu
// ============================================================================

#[test]
fn test_right_click_on_caption_opens_system_menu() {
    let sim = SimPlatform::single_monitor();
    sim.set_menu_choice(Some(SystemCommand::Maximize));
    let desktop = Desktop::new(sim);
    let chrome = desktop.attach(caption_config());

    assert_eq!(chrome.handle(ChromeMessage::NcRightButtonUp { point: ON_CAPTION }), Reply::Handled);
    assert_eq!(desktop.sim.count(|c| matches!(c, SimCall::TrackSystemMenu(_))), 1);
    assert_eq!(
        desktop.sim.count(|c| *c == SimCall::PostSystemCommand(SystemCommand::Maximize)),
        1
    );
}

#[test]
fn test_right_click_on_client_is_ignored() {
    let sim = SimPlatform::single_monitor();
    sim.set_menu_choice(Some(SystemCommand::Maximize));
    let desktop = Desktop::new(sim);
    let chrome = desktop.attach(caption_config());

    let client = DevicePoint::new(500, 400);
    assert_eq!(chrome.handle(ChromeMessage::NcRightButtonUp { point: client }), Reply::Unhandled);
    assert_eq!(desktop.sim.count(|c| matches!(c, SimCall::TrackSystemMenu(_))), 0);
}

#[test]
fn test_menu_reflects_window_state() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    desktop.sim.maximize(desktop.main);

    assert_eq!(chrome.show_system_menu(ON_CAPTION).expect("Failed to show menu"), None);
    let menus: Vec<SimCall> = desktop
        .sim
        .calls()
        .into_iter()
        .filter(|c| matches!(c, SimCall::TrackSystemMenu(_)))
        .collect();
    let [SimCall::TrackSystemMenu(menu)] = menus.as_slice() else {
        panic!("expected one system menu, got {menus:?}");
    };
    assert!(menu.restore);
    assert!(!menu.maximize);
    assert!(!menu.move_window);
    assert!(!menu.size);
    assert!(menu.minimize);
    assert!(menu.close);
}

#[test]
fn test_disabled_command_is_not_posted() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config().with_enable_maximize(false));

    assert!(!chrome.post_system_command(SystemCommand::Maximize).expect("Failed to post command"));
    assert!(chrome.post_system_command(SystemCommand::Minimize).expect("Failed to post command"));
    assert_eq!(desktop.sim.count(|c| matches!(c, SimCall::PostSystemCommand(_))), 1);
}

#[test]
fn test_commands_after_detach_fail() {
    let desktop = Desktop::new(SimPlatform::single_monitor());
    let chrome = desktop.attach(caption_config());
    chrome.detach();

    assert!(matches!(
        chrome.post_system_command(SystemCommand::Close),
        Err(ChromeError::Detached)
    ));
    assert!(matches!(
        chrome.show_system_menu(ON_CAPTION),
        Err(ChromeError::Detached)
    ));
    assert_eq!(chrome.handle(ChromeMessage::NcRightButtonUp { point: ON_CAPTION }), Reply::Unhandled);
}
