//! Typed window messages and replies.
//!
//! The native message pump is modeled as an ordered stream of
//! [`ChromeMessage`] values delivered to [`ChromeWindow::handle`], which
//! answers each with a [`Reply`]. A platform backend translates between
//! these types and its native representation.
//!
//! [`ChromeWindow::handle`]: crate::interceptor::ChromeWindow::handle

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use cursor_icon::CursorIcon;
use horizon_chrome_core::{DevicePoint, DeviceRect, DeviceSize, DpiScale, WindowHandle};

use crate::hit_test::HitTestResult;

// ============================================================================
// Position Flags
// ============================================================================

/// Flags qualifying a window position change.
///
/// Bit values match the native window-position flags so backends can pass
/// them through unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PosFlags(u32);

impl PosFlags {
    pub const NONE: PosFlags = PosFlags(0);
    /// Keep the current size.
    pub const NO_SIZE: PosFlags = PosFlags(0x0001);
    /// Keep the current position.
    pub const NO_MOVE: PosFlags = PosFlags(0x0002);
    /// Keep the current Z order.
    pub const NO_ZORDER: PosFlags = PosFlags(0x0004);
    pub const NO_REDRAW: PosFlags = PosFlags(0x0008);
    /// Do not activate the window.
    pub const NO_ACTIVATE: PosFlags = PosFlags(0x0010);
    /// Recalculate the non-client frame.
    pub const FRAME_CHANGED: PosFlags = PosFlags(0x0020);
    pub const SHOW_WINDOW: PosFlags = PosFlags(0x0040);
    pub const HIDE_WINDOW: PosFlags = PosFlags(0x0080);
    /// Do not move the owner along with the window.
    pub const NO_OWNER_ZORDER: PosFlags = PosFlags(0x0200);

    const NAMES: [(PosFlags, &'static str); 9] = [
        (Self::NO_SIZE, "NO_SIZE"),
        (Self::NO_MOVE, "NO_MOVE"),
        (Self::NO_ZORDER, "NO_ZORDER"),
        (Self::NO_REDRAW, "NO_REDRAW"),
        (Self::NO_ACTIVATE, "NO_ACTIVATE"),
        (Self::FRAME_CHANGED, "FRAME_CHANGED"),
        (Self::SHOW_WINDOW, "SHOW_WINDOW"),
        (Self::HIDE_WINDOW, "HIDE_WINDOW"),
        (Self::NO_OWNER_ZORDER, "NO_OWNER_ZORDER"),
    ];

    /// Create flags from raw native bits.
    pub const fn from_bits(bits: u32) -> Self {
        PosFlags(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: PosFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if any flag in `other` is present.
    pub const fn intersects(&self, other: PosFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: PosFlags) -> PosFlags {
        PosFlags(self.0 | other.0)
    }

    pub const fn without(self, other: PosFlags) -> PosFlags {
        PosFlags(self.0 & !other.0)
    }
}

impl BitOr for PosFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for PosFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for PosFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

// ============================================================================
// Window Style
// ============================================================================

/// Native window style bits relevant to custom chrome.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowStyle(u32);

impl WindowStyle {
    pub const NONE: WindowStyle = WindowStyle(0);
    pub const POPUP: WindowStyle = WindowStyle(0x8000_0000);
    pub const VISIBLE: WindowStyle = WindowStyle(0x1000_0000);
    pub const CAPTION: WindowStyle = WindowStyle(0x00C0_0000);
    pub const SYSTEM_MENU: WindowStyle = WindowStyle(0x0008_0000);
    pub const THICK_FRAME: WindowStyle = WindowStyle(0x0004_0000);
    pub const MINIMIZE_BOX: WindowStyle = WindowStyle(0x0002_0000);
    pub const MAXIMIZE_BOX: WindowStyle = WindowStyle(0x0001_0000);
    /// The standard overlapped top-level window.
    pub const OVERLAPPED_WINDOW: WindowStyle = WindowStyle(
        Self::CAPTION.0
            | Self::SYSTEM_MENU.0
            | Self::THICK_FRAME.0
            | Self::MINIMIZE_BOX.0
            | Self::MAXIMIZE_BOX.0,
    );

    pub const fn from_bits(bits: u32) -> Self {
        WindowStyle(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: WindowStyle) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: WindowStyle) -> WindowStyle {
        WindowStyle(self.0 | other.0)
    }

    pub const fn without(self, other: WindowStyle) -> WindowStyle {
        WindowStyle(self.0 & !other.0)
    }

    /// Set or clear `other`.
    pub const fn toggled(self, other: WindowStyle, on: bool) -> WindowStyle {
        if on { self.with(other) } else { self.without(other) }
    }
}

impl BitOr for WindowStyle {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.with(rhs)
    }
}

impl fmt::Debug for WindowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowStyle({:#010x})", self.0)
    }
}

// ============================================================================
// Position Types
// ============================================================================

/// Where a window goes in the Z order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZOrder {
    /// Leave the Z order alone.
    #[default]
    Unchanged,
    /// Front of its sibling chain.
    Top,
    /// Immediately behind the given window.
    After(WindowHandle),
}

/// A proposed or applied window position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPos {
    pub insert_after: ZOrder,
    /// Outer window rectangle in device pixels.
    pub rect: DeviceRect,
    pub flags: PosFlags,
}

impl WindowPos {
    /// Move and resize without touching the Z order.
    pub fn bounds(rect: DeviceRect) -> Self {
        Self {
            insert_after: ZOrder::Unchanged,
            rect,
            flags: PosFlags::NO_ZORDER | PosFlags::NO_ACTIVATE | PosFlags::NO_OWNER_ZORDER,
        }
    }

    /// Change only the Z order.
    pub fn z_order(insert_after: ZOrder) -> Self {
        Self {
            insert_after,
            rect: DeviceRect::default(),
            flags: PosFlags::NO_MOVE
                | PosFlags::NO_SIZE
                | PosFlags::NO_ACTIVATE
                | PosFlags::NO_OWNER_ZORDER,
        }
    }

    /// Recalculate the frame without moving.
    pub fn frame_changed() -> Self {
        Self {
            insert_after: ZOrder::Unchanged,
            rect: DeviceRect::default(),
            flags: PosFlags::NO_MOVE
                | PosFlags::NO_SIZE
                | PosFlags::NO_ZORDER
                | PosFlags::NO_ACTIVATE
                | PosFlags::NO_OWNER_ZORDER
                | PosFlags::FRAME_CHANGED,
        }
    }

    pub fn with_flags(mut self, flags: PosFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Check if this changes position or size.
    pub fn moves_or_sizes(&self) -> bool {
        !self.flags.contains(PosFlags::NO_MOVE | PosFlags::NO_SIZE)
    }

    /// Check if this changes the Z order.
    pub fn changes_z_order(&self) -> bool {
        !self.flags.contains(PosFlags::NO_ZORDER)
    }
}

/// Min/max tracking information for a window about to be sized or zoomed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinMaxInfo {
    /// Origin of the zoomed window.
    pub max_position: DevicePoint,
    /// Size of the zoomed window.
    pub max_size: DeviceSize,
    pub min_track_size: DeviceSize,
    pub max_track_size: DeviceSize,
}

/// Kind of size change reported after it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKind {
    Restored,
    Minimized,
    Maximized,
}

// ============================================================================
// Messages
// ============================================================================

/// A message for the main chrome window.
///
/// Points are in device pixels, screen relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChromeMessage {
    /// How much of `proposed` is client area.
    NcCalcSize { proposed: DeviceRect },
    /// What region is under `point`.
    NcHitTest { point: DevicePoint },
    /// A position change is about to be applied.
    WindowPosChanging { pos: WindowPos },
    /// A position change was applied.
    WindowPosChanged { pos: WindowPos },
    /// Min/max tracking query before sizing or zooming.
    GetMinMaxInfo { info: MinMaxInfo },
    /// The window style is about to change.
    StyleChanging { old: WindowStyle, new: WindowStyle },
    Size { kind: SizeKind },
    EraseBackground,
    Paint,
    NcActivate { active: bool },
    Activate { active: bool },
    EnterSizeMove,
    ExitSizeMove,
    NcMouseMove { point: DevicePoint },
    NcMouseLeave,
    NcLeftButtonDown { point: DevicePoint },
    NcLeftButtonUp { point: DevicePoint },
    NcRightButtonUp { point: DevicePoint },
    /// The caption text or icon changed.
    CaptionTextOrIconChanged,
    DpiChanged { scale: DpiScale, suggested: DeviceRect },
    ShowWindow { visible: bool },
    /// The dispatcher wakeup requested through the platform fired.
    Timer,
    Destroy,
}

/// A message for one of the glow windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlowMessage {
    MouseActivate,
    NcHitTest { point: DevicePoint },
    SetCursor { point: DevicePoint },
    LeftButtonDown { point: DevicePoint },
    /// The glow window was destroyed by someone else.
    Destroyed,
}

/// The answer to a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    /// Run the platform's default handling.
    Unhandled,
    /// Consumed; skip default handling.
    Handled,
    HitTest(HitTestResult),
    /// The client rectangle for `NcCalcSize`.
    ClientArea(DeviceRect),
    /// A rewritten position for `WindowPosChanging`.
    WindowPos(WindowPos),
    /// Rewritten tracking info for `GetMinMaxInfo`.
    MinMaxInfo(MinMaxInfo),
    /// Rewritten style for `StyleChanging`.
    Style(WindowStyle),
    BackgroundErased,
    /// Activation processed; the platform must not repaint its caption.
    SuppressNcRepaint,
    /// Run default handling with redraw suppressed.
    DefaultWithoutRedraw,
    NoActivate,
    Cursor(CursorIcon),
}

impl Reply {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Reply::Unhandled | Reply::DefaultWithoutRedraw)
    }
}
