//! Hover, press and click emulation for controls drawn in the non-client
//! area (custom caption buttons and similar).
//!
//! The OS routes mouse input over the caption and borders to the window as
//! non-client messages, so controls drawn there never see ordinary mouse
//! events. [`NonClientControlTracker`] keeps weak references to those
//! controls and drives their visual state from the non-client stream.
//!
//! A click only fires when the button is released over the same control
//! that was pressed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use horizon_chrome_core::LogicalPoint;
use horizon_chrome_core::LogicalRect;
use horizon_chrome_core::logging::targets;

use crate::hit_test::HitTestResult;

/// How a control reacts to a completed click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClickStrategy {
    /// Visual state only; the chrome performs the button's system command.
    #[default]
    None,
    /// Deliver a synthesized mouse click to the control.
    MouseEvent,
    /// Invoke the control through its accessibility action.
    Invoke,
}

/// A control rendered in the non-client area.
pub trait NonClientControl {
    /// Bounds relative to the window's top-left corner, in logical units.
    fn bounds(&self) -> LogicalRect;

    /// The region this control reports to the OS.
    fn hit_test_result(&self) -> HitTestResult;

    fn click_strategy(&self) -> ClickStrategy {
        ClickStrategy::None
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn set_hovered(&self, hovered: bool);

    fn set_pressed(&self, pressed: bool);

    /// Deliver a synthesized click.
    fn raise_click(&self) {}

    /// Run the accessibility invoke action. Returns false when the control
    /// has no invoke pattern.
    fn invoke(&self) -> bool {
        false
    }
}

/// Result of a button release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No pressed control, or released over a different control.
    Ignored,
    /// The control handled the click itself.
    Handled(HitTestResult),
    /// The control only tracks visual state; its region's default action
    /// should run.
    Passive(HitTestResult),
}

/// Tracks which non-client control is hovered and pressed.
#[derive(Default)]
pub struct NonClientControlTracker {
    controls: RefCell<Vec<Weak<dyn NonClientControl>>>,
    hovered: RefCell<Option<Weak<dyn NonClientControl>>>,
    pressed: RefCell<Option<Weak<dyn NonClientControl>>>,
}

impl fmt::Debug for NonClientControlTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonClientControlTracker")
            .field("controls", &self.controls.borrow().len())
            .field("hovered", &self.hovered.borrow().is_some())
            .field("pressed", &self.pressed.borrow().is_some())
            .finish()
    }
}

impl NonClientControlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a control. The tracker only holds a weak reference.
    pub fn register(&self, control: &Rc<dyn NonClientControl>) {
        self.controls.borrow_mut().push(Rc::downgrade(control));
    }

    pub fn unregister(&self, control: &Rc<dyn NonClientControl>) {
        let weak = Rc::downgrade(control);
        self.controls.borrow_mut().retain(|c| !c.ptr_eq(&weak));
        for slot in [&self.hovered, &self.pressed] {
            let mut slot = slot.borrow_mut();
            if slot.as_ref().is_some_and(|c| c.ptr_eq(&weak)) {
                *slot = None;
            }
        }
    }

    /// Number of live registered controls.
    pub fn len(&self) -> usize {
        self.prune();
        self.controls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self) {
        self.controls.borrow_mut().retain(|c| c.strong_count() > 0);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The topmost enabled control under `point` (last registered wins).
    pub fn control_at(&self, point: LogicalPoint) -> Option<Rc<dyn NonClientControl>> {
        self.prune();
        let controls: Vec<_> = self.controls.borrow().iter().filter_map(Weak::upgrade).collect();
        controls
            .into_iter()
            .rev()
            .find(|c| c.is_enabled() && c.bounds().contains(point))
    }

    /// The region reported by the control under `point`, if any.
    pub fn hit_test(&self, point: LogicalPoint) -> Option<HitTestResult> {
        self.control_at(point).map(|c| c.hit_test_result())
    }

    pub fn hovered(&self) -> Option<Rc<dyn NonClientControl>> {
        self.hovered.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn pressed(&self) -> Option<Rc<dyn NonClientControl>> {
        self.pressed.borrow().as_ref().and_then(Weak::upgrade)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Move the hover to the control under `point`.
    ///
    /// Returns the hovered control's region.
    pub fn hover(&self, point: LogicalPoint) -> Option<HitTestResult> {
        let target = self.control_at(point);
        let previous = self.hovered();

        let same = match (&previous, &target) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            *self.hovered.borrow_mut() = target.as_ref().map(Rc::downgrade);
            if let Some(previous) = previous {
                previous.set_hovered(false);
            }
            if let Some(target) = &target {
                target.set_hovered(true);
            }
            tracing::trace!(target: targets::TRACKER, hovered = target.is_some(), "hover changed");
        }

        target.map(|c| c.hit_test_result())
    }

    /// Press the control under `point`. Returns false when there is none.
    pub fn press(&self, point: LogicalPoint) -> bool {
        let Some(target) = self.control_at(point) else {
            self.release_pressed();
            return false;
        };

        self.release_pressed();
        *self.pressed.borrow_mut() = Some(Rc::downgrade(&target));
        target.set_pressed(true);
        tracing::trace!(target: targets::TRACKER, region = ?target.hit_test_result(), "control pressed");
        true
    }

    /// Release over `point`, clicking the pressed control if it is still
    /// under the pointer.
    pub fn click(&self, point: LogicalPoint) -> ClickOutcome {
        let pressed = self.pressed.borrow_mut().take().and_then(|w| w.upgrade());
        let Some(pressed) = pressed else {
            return ClickOutcome::Ignored;
        };
        pressed.set_pressed(false);

        let released_on = self.control_at(point);
        if !released_on.is_some_and(|c| Rc::ptr_eq(&c, &pressed)) {
            tracing::trace!(target: targets::TRACKER, "released off the pressed control");
            return ClickOutcome::Ignored;
        }

        let region = pressed.hit_test_result();
        let outcome = match pressed.click_strategy() {
            ClickStrategy::None => ClickOutcome::Passive(region),
            ClickStrategy::MouseEvent => {
                pressed.raise_click();
                ClickOutcome::Handled(region)
            }
            ClickStrategy::Invoke => {
                if pressed.invoke() {
                    ClickOutcome::Handled(region)
                } else {
                    tracing::debug!(target: targets::TRACKER, ?region, "no invoke action, falling back to click");
                    pressed.raise_click();
                    ClickOutcome::Handled(region)
                }
            }
        };
        tracing::trace!(target: targets::TRACKER, ?outcome, "control clicked");
        outcome
    }

    /// Clear the hover only.
    pub fn clear_hover(&self) {
        let previous = self.hovered.borrow_mut().take().and_then(|w| w.upgrade());
        if let Some(previous) = previous {
            previous.set_hovered(false);
        }
    }

    /// Clear hover and press state.
    pub fn clear(&self) {
        self.clear_hover();
        self.release_pressed();
    }

    fn release_pressed(&self) {
        let previous = self.pressed.borrow_mut().take().and_then(|w| w.upgrade());
        if let Some(previous) = previous {
            previous.set_pressed(false);
        }
    }
}
