//! Native Windows backend.
//!
//! [`Win32Platform`] implements [`WindowPlatform`] on top of the `windows`
//! crate. [`attach`] subclasses a top-level window so its messages reach a
//! [`ChromeWindow`]; [`attach_winit`] does the same for a winit window.
//!
//! Glow windows are layered popups of the `HorizonChromeGlow` class, owned
//! by the main window. Their messages are routed to the owner's chrome.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::mem::size_of;
use std::rc::{Rc, Weak};
use std::time::Duration;

use cursor_icon::CursorIcon;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::Win32::Foundation::{
    BOOL, COLORREF, FALSE, HWND, LPARAM, LRESULT, POINT, RECT, SIZE, WPARAM,
};
use windows::Win32::Graphics::Dwm::{
    DWMWA_BORDER_COLOR, DWMWA_WINDOW_CORNER_PREFERENCE, DWM_WINDOW_CORNER_PREFERENCE,
    DWMWINDOWATTRIBUTE, DwmSetWindowAttribute,
};
use windows::Win32::Graphics::Gdi::{
    AC_SRC_ALPHA, AC_SRC_OVER, BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION,
    CreateCompatibleDC, CreateDIBSection, CreateSolidBrush, DIB_RGB_COLORS, DeleteDC,
    DeleteObject, FillRect, GetDC, GetMonitorInfoW, MONITOR_DEFAULTTONEAREST, MONITORINFO,
    MonitorFromRect, MonitorFromWindow, ReleaseDC, SelectObject, HMONITOR,
};
use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};
use windows::Win32::UI::Controls::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass};
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    ReleaseCapture, TME_LEAVE, TME_NONCLIENT, TRACKMOUSEEVENT, TrackMouseEvent,
};
use windows::Win32::UI::Shell::{
    ABE_BOTTOM, ABE_LEFT, ABE_RIGHT, ABE_TOP, ABM_GETAUTOHIDEBAREX, ABM_GETSTATE, ABS_AUTOHIDE,
    APPBARDATA, SHAppBarMessage,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BeginDeferWindowPos, CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW,
    DeferWindowPos, DestroyWindow, EnableMenuItem, EndDeferWindowPos, GW_OWNER, GWL_STYLE,
    GetClientRect, GetCursorPos, GetSystemMenu, GetWindow, GetWindowLongW, GetWindowRect,
    IDC_ARROW, IDC_SIZENESW, IDC_SIZENS, IDC_SIZENWSE, IDC_SIZEWE, IsIconic, IsWindow,
    IsWindowVisible, IsZoomed, KillTimer, LoadCursorW, MF_BYCOMMAND, MF_ENABLED, MF_GRAYED,
    MINMAXINFO, NCCALCSIZE_PARAMS, PostMessageW, RegisterClassExW, SET_WINDOW_POS_FLAGS,
    SPI_GETCLIENTAREAANIMATION, STYLESTRUCT, SW_MAXIMIZE, SW_MINIMIZE, SW_RESTORE,
    SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, SendMessageW, SetCursor, SetTimer, SetWindowLongW,
    SetWindowPos, ShowWindow, SystemParametersInfoW, TPM_RETURNCMD, TrackPopupMenuEx,
    ULW_ALPHA, UpdateLayeredWindow, WINDOWPOS, WM_ACTIVATE, WM_DESTROY, WM_DPICHANGED,
    WM_ENTERSIZEMOVE, WM_ERASEBKGND, WM_EXITSIZEMOVE, WM_GETMINMAXINFO, WM_LBUTTONDOWN,
    WM_MOUSEACTIVATE, WM_NCACTIVATE, WM_NCCALCSIZE, WM_NCDESTROY, WM_NCHITTEST,
    WM_NCLBUTTONDOWN, WM_NCLBUTTONUP, WM_NCMOUSELEAVE, WM_NCMOUSEMOVE, WM_NCRBUTTONUP,
    WM_PAINT, WM_SETCURSOR, WM_SETICON, WM_SETTEXT, WM_SHOWWINDOW, WM_SIZE, WM_STYLECHANGING,
    WM_SYSCOMMAND, WM_TIMER, WM_WINDOWPOSCHANGED, WM_WINDOWPOSCHANGING, WNDCLASSEXW,
    WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_POPUP, WS_VISIBLE,
};
use windows::core::{PCWSTR, s, w};

use horizon_chrome_core::logging::targets;
use horizon_chrome_core::{
    ChromeError, ChromeResult, DevicePoint, DeviceRect, DeviceSize, DpiScale, MonitorId,
    WindowHandle, WindowState,
};

use super::{WindowPlatform, WindowPosUpdate};
use crate::config::{Color, CornerPreference};
use crate::glow::{GlowAppearance, GlowEdge};
use crate::hit_test::HitTestResult;
use crate::interceptor::{ChromeWindow, ChromeWindowBuilder};
use crate::message::{
    ChromeMessage, GlowMessage, MinMaxInfo, PosFlags, Reply, SizeKind, WindowPos, WindowStyle,
    ZOrder,
};
use crate::monitor::{MonitorInfo, ScreenEdge};
use crate::system_menu::{SystemCommand, SystemMenuState};

// ============================================================================
// Constants
// ============================================================================

const SUBCLASS_ID: usize = 0x4843_5743;
const WAKEUP_TIMER_ID: usize = 0x4843_5754;
const GLOW_CLASS: PCWSTR = w!("HorizonChromeGlow");
/// First Windows build with DWM border colors.
const BORDER_COLOR_BUILD: u32 = 22000;
const DWMWA_COLOR_DEFAULT: u32 = 0xFFFF_FFFF;
const MA_NOACTIVATE: isize = 3;

const SC_SIZE: u32 = 0xF000;
const SC_MOVE: u32 = 0xF010;
const SC_MINIMIZE: u32 = 0xF020;
const SC_MAXIMIZE: u32 = 0xF030;
const SC_CLOSE: u32 = 0xF060;
const SC_RESTORE: u32 = 0xF120;

const SIZE_RESTORED: usize = 0;
const SIZE_MINIMIZED: usize = 1;
const SIZE_MAXIMIZED: usize = 2;

thread_local! {
    static CHROME_WINDOWS: RefCell<HashMap<usize, Weak<ChromeWindow>>> = RefCell::new(HashMap::new());
    static GLOW_CLASS_REGISTERED: Cell<bool> = const { Cell::new(false) };
}

// ============================================================================
// Conversions
// ============================================================================

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_raw() as usize as *mut c_void)
}

fn handle_of(hwnd: HWND) -> Option<WindowHandle> {
    WindowHandle::from_raw(hwnd.0 as usize as u64)
}

fn device_rect(rect: RECT) -> DeviceRect {
    DeviceRect::new(rect.left, rect.top, rect.right, rect.bottom)
}

fn native_rect(rect: DeviceRect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

fn point_from_lparam(lparam: LPARAM) -> DevicePoint {
    let x = (lparam.0 & 0xFFFF) as u16 as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32;
    DevicePoint::new(x, y)
}

fn cursor_point() -> Option<DevicePoint> {
    let mut point = POINT::default();
    unsafe { GetCursorPos(&mut point) }.ok()?;
    Some(DevicePoint::new(point.x, point.y))
}

fn insert_after_hwnd(z: ZOrder) -> HWND {
    match z {
        ZOrder::Unchanged | ZOrder::Top => HWND::default(),
        ZOrder::After(window) => hwnd(window),
    }
}

fn window_pos_from_native(pos: &WINDOWPOS) -> WindowPos {
    let flags = PosFlags::from_bits(pos.flags.0);
    let insert_after = if flags.contains(PosFlags::NO_ZORDER) {
        ZOrder::Unchanged
    } else {
        handle_of(pos.hwndInsertAfter).map_or(ZOrder::Top, ZOrder::After)
    };
    WindowPos {
        insert_after,
        rect: DeviceRect::new(pos.x, pos.y, pos.x + pos.cx, pos.y + pos.cy),
        flags,
    }
}

fn hit_test_code(result: HitTestResult) -> isize {
    match result {
        HitTestResult::Nowhere => 0,
        HitTestResult::Client => 1,
        HitTestResult::Caption => 2,
        HitTestResult::MinimizeButton => 8,
        HitTestResult::MaximizeButton => 9,
        HitTestResult::Left => 10,
        HitTestResult::Right => 11,
        HitTestResult::Top => 12,
        HitTestResult::TopLeft => 13,
        HitTestResult::TopRight => 14,
        HitTestResult::Bottom => 15,
        HitTestResult::BottomLeft => 16,
        HitTestResult::BottomRight => 17,
        HitTestResult::CloseButton => 20,
    }
}

/// The `WMSZ_*` edge for an interactive resize.
fn sizing_edge(region: HitTestResult) -> Option<u32> {
    match region {
        HitTestResult::Left => Some(1),
        HitTestResult::Right => Some(2),
        HitTestResult::Top => Some(3),
        HitTestResult::TopLeft => Some(4),
        HitTestResult::TopRight => Some(5),
        HitTestResult::Bottom => Some(6),
        HitTestResult::BottomLeft => Some(7),
        HitTestResult::BottomRight => Some(8),
        _ => None,
    }
}

fn command_id(command: SystemCommand) -> u32 {
    match command {
        SystemCommand::Minimize => SC_MINIMIZE,
        SystemCommand::Maximize => SC_MAXIMIZE,
        SystemCommand::Restore => SC_RESTORE,
        SystemCommand::Close => SC_CLOSE,
        SystemCommand::Move => SC_MOVE,
        SystemCommand::Size => SC_SIZE,
    }
}

fn command_from_id(id: u32) -> Option<SystemCommand> {
    match id {
        SC_MINIMIZE => Some(SystemCommand::Minimize),
        SC_MAXIMIZE => Some(SystemCommand::Maximize),
        SC_RESTORE => Some(SystemCommand::Restore),
        SC_CLOSE => Some(SystemCommand::Close),
        SC_MOVE => Some(SystemCommand::Move),
        SC_SIZE => Some(SystemCommand::Size),
        _ => None,
    }
}

fn platform_error(operation: &'static str, err: windows::core::Error) -> ChromeError {
    ChromeError::platform(operation, err.message())
}

// ============================================================================
// OS Version
// ============================================================================

#[repr(C)]
struct OsVersionInfo {
    size: u32,
    major: u32,
    minor: u32,
    build: u32,
    platform: u32,
    service_pack: [u16; 128],
}

/// The Windows build number, read without manifest-dependent lies.
fn windows_build() -> Option<u32> {
    type RtlGetVersion = unsafe extern "system" fn(*mut OsVersionInfo) -> i32;

    unsafe {
        let ntdll = GetModuleHandleW(w!("ntdll.dll")).ok()?;
        let proc = GetProcAddress(ntdll, s!("RtlGetVersion"))?;
        let rtl_get_version: RtlGetVersion = std::mem::transmute(proc);
        let mut info = OsVersionInfo {
            size: size_of::<OsVersionInfo>() as u32,
            major: 0,
            minor: 0,
            build: 0,
            platform: 0,
            service_pack: [0; 128],
        };
        (rtl_get_version(&mut info) == 0).then_some(info.build)
    }
}

// ============================================================================
// Platform
// ============================================================================

/// [`WindowPlatform`] for Windows.
#[derive(Debug)]
pub struct Win32Platform {
    native_border: bool,
}

impl Win32Platform {
    pub fn new() -> Self {
        let build = windows_build();
        tracing::debug!(target: targets::PLATFORM, ?build, "win32 platform created");
        Self {
            native_border: build.is_some_and(|build| build >= BORDER_COLOR_BUILD),
        }
    }

    fn dwm_set<T>(
        &self,
        window: WindowHandle,
        attribute: DWMWINDOWATTRIBUTE,
        value: &T,
    ) -> windows::core::Result<()> {
        unsafe {
            DwmSetWindowAttribute(
                hwnd(window),
                attribute,
                value as *const T as *const c_void,
                size_of::<T>() as u32,
            )
        }
    }

    fn ensure_glow_class() -> ChromeResult<()> {
        if GLOW_CLASS_REGISTERED.get() {
            return Ok(());
        }
        let instance = unsafe { GetModuleHandleW(None) }
            .map_err(|err| platform_error("GetModuleHandleW", err))?;
        let class = WNDCLASSEXW {
            cbSize: size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(glow_window_proc),
            hInstance: instance.into(),
            lpszClassName: GLOW_CLASS,
            ..Default::default()
        };
        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(ChromeError::platform(
                "RegisterClassExW",
                "glow window class registration failed",
            ));
        }
        GLOW_CLASS_REGISTERED.set(true);
        Ok(())
    }
}

impl Default for Win32Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowPlatform for Win32Platform {
    fn is_window(&self, window: WindowHandle) -> bool {
        unsafe { IsWindow(hwnd(window)) }.as_bool()
    }

    fn window_rect(&self, window: WindowHandle) -> Option<DeviceRect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut rect) }.ok()?;
        Some(device_rect(rect))
    }

    fn window_state(&self, window: WindowHandle) -> Option<WindowState> {
        let hwnd = hwnd(window);
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                None
            } else if IsIconic(hwnd).as_bool() {
                Some(WindowState::Minimized)
            } else if IsZoomed(hwnd).as_bool() {
                Some(WindowState::Maximized)
            } else {
                Some(WindowState::Normal)
            }
        }
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        unsafe { IsWindowVisible(hwnd(window)) }.as_bool()
    }

    fn dpi_scale(&self, window: WindowHandle) -> DpiScale {
        match unsafe { GetDpiForWindow(hwnd(window)) } {
            0 => DpiScale::IDENTITY,
            dpi => DpiScale::from_dpi(dpi),
        }
    }

    fn owner(&self, window: WindowHandle) -> Option<WindowHandle> {
        let owner = unsafe { GetWindow(hwnd(window), GW_OWNER) }.ok()?;
        handle_of(owner)
    }

    fn window_style(&self, window: WindowHandle) -> WindowStyle {
        WindowStyle::from_bits(unsafe { GetWindowLongW(hwnd(window), GWL_STYLE) } as u32)
    }

    fn set_window_style(&self, window: WindowHandle, style: WindowStyle) -> ChromeResult<()> {
        unsafe { SetWindowLongW(hwnd(window), GWL_STYLE, style.bits() as i32) };
        Ok(())
    }

    fn set_window_pos(&self, update: WindowPosUpdate) -> ChromeResult<()> {
        let WindowPosUpdate { window, pos } = update;
        let rect = pos.rect;
        unsafe {
            SetWindowPos(
                hwnd(window),
                insert_after_hwnd(pos.insert_after),
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SET_WINDOW_POS_FLAGS(pos.flags.bits()),
            )
        }
        .map_err(|err| platform_error("SetWindowPos", err))
    }

    fn defer_window_pos(&self, updates: &[WindowPosUpdate]) -> ChromeResult<()> {
        unsafe {
            let mut batch = BeginDeferWindowPos(updates.len() as i32)
                .map_err(|err| platform_error("BeginDeferWindowPos", err))?;
            for update in updates {
                let rect = update.pos.rect;
                batch = DeferWindowPos(
                    batch,
                    hwnd(update.window),
                    insert_after_hwnd(update.pos.insert_after),
                    rect.left,
                    rect.top,
                    rect.width(),
                    rect.height(),
                    SET_WINDOW_POS_FLAGS(update.pos.flags.bits()),
                )
                .map_err(|err| platform_error("DeferWindowPos", err))?;
            }
            EndDeferWindowPos(batch).map_err(|err| platform_error("EndDeferWindowPos", err))
        }
    }

    fn set_window_state(&self, window: WindowHandle, state: WindowState) -> ChromeResult<()> {
        let command = match state {
            WindowState::Normal => SW_RESTORE,
            WindowState::Maximized => SW_MAXIMIZE,
            WindowState::Minimized => SW_MINIMIZE,
        };
        // Returns the previous visibility, not success.
        let _ = unsafe { ShowWindow(hwnd(window), command) };
        Ok(())
    }

    fn begin_resize(&self, window: WindowHandle, region: HitTestResult) -> ChromeResult<()> {
        let Some(edge) = sizing_edge(region) else {
            return Ok(());
        };
        unsafe {
            let _ = ReleaseCapture();
            SendMessageW(
                hwnd(window),
                WM_SYSCOMMAND,
                WPARAM((SC_SIZE | edge) as usize),
                LPARAM(0),
            );
        }
        Ok(())
    }

    fn monitor_from_rect(&self, rect: DeviceRect) -> Option<MonitorId> {
        let monitor = unsafe { MonitorFromRect(&native_rect(rect), MONITOR_DEFAULTTONEAREST) };
        (!monitor.is_invalid()).then(|| MonitorId(monitor.0 as usize as u64))
    }

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorId> {
        let monitor = unsafe { MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST) };
        (!monitor.is_invalid()).then(|| MonitorId(monitor.0 as usize as u64))
    }

    fn monitor_info(&self, monitor: MonitorId) -> Option<MonitorInfo> {
        let mut info = MONITORINFO {
            cbSize: size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        let handle = HMONITOR(monitor.0 as usize as *mut c_void);
        if !unsafe { GetMonitorInfoW(handle, &mut info) }.as_bool() {
            return None;
        }
        Some(
            MonitorInfo::new(monitor, device_rect(info.rcMonitor), device_rect(info.rcWork))
                .with_primary(info.dwFlags & 1 != 0),
        )
    }

    fn auto_hide_taskbar_edge(&self, monitor: &MonitorInfo) -> Option<ScreenEdge> {
        let mut data = APPBARDATA {
            cbSize: size_of::<APPBARDATA>() as u32,
            ..Default::default()
        };
        let state = unsafe { SHAppBarMessage(ABM_GETSTATE, &mut data) } as u32;
        if state & ABS_AUTOHIDE == 0 {
            return None;
        }

        let edges = [
            (ABE_BOTTOM, ScreenEdge::Bottom),
            (ABE_LEFT, ScreenEdge::Left),
            (ABE_TOP, ScreenEdge::Top),
            (ABE_RIGHT, ScreenEdge::Right),
        ];
        edges.into_iter().find_map(|(native, edge)| {
            let mut data = APPBARDATA {
                cbSize: size_of::<APPBARDATA>() as u32,
                uEdge: native,
                rc: native_rect(monitor.monitor_rect),
                ..Default::default()
            };
            let bar = unsafe { SHAppBarMessage(ABM_GETAUTOHIDEBAREX, &mut data) };
            (bar != 0).then_some(edge)
        })
    }

    fn client_area_animation(&self) -> bool {
        let mut enabled = BOOL(1);
        let result = unsafe {
            SystemParametersInfoW(
                SPI_GETCLIENTAREAANIMATION,
                0,
                Some(&mut enabled as *mut BOOL as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        };
        if let Err(err) = result {
            tracing::warn!(target: targets::PLATFORM, %err, "client area animation query failed");
            return true;
        }
        enabled.as_bool()
    }

    fn fill_background(&self, window: WindowHandle, color: Color) -> ChromeResult<()> {
        let hwnd = hwnd(window);
        unsafe {
            let mut rect = RECT::default();
            GetClientRect(hwnd, &mut rect).map_err(|err| platform_error("GetClientRect", err))?;
            let dc = GetDC(hwnd);
            if dc.is_invalid() {
                return Err(ChromeError::platform("GetDC", "no device context"));
            }
            let brush = CreateSolidBrush(COLORREF(color.to_colorref()));
            FillRect(dc, &rect, brush);
            let _ = DeleteObject(brush);
            ReleaseDC(hwnd, dc);
        }
        Ok(())
    }

    fn supports_native_border_color(&self) -> bool {
        self.native_border
    }

    fn set_native_border_color(&self, window: WindowHandle, color: Option<Color>) -> bool {
        let value = color.map_or(DWMWA_COLOR_DEFAULT, Color::to_colorref);
        match self.dwm_set(window, DWMWA_BORDER_COLOR, &value) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(target: targets::PLATFORM, %err, "border color rejected");
                false
            }
        }
    }

    fn set_corner_preference(
        &self,
        window: WindowHandle,
        preference: CornerPreference,
    ) -> ChromeResult<()> {
        let value = DWM_WINDOW_CORNER_PREFERENCE(match preference {
            CornerPreference::Default => 0,
            CornerPreference::DoNotRound => 1,
            CornerPreference::Round => 2,
            CornerPreference::RoundSmall => 3,
        });
        self.dwm_set(window, DWMWA_WINDOW_CORNER_PREFERENCE, &value)
            .map_err(|err| platform_error("DwmSetWindowAttribute", err))
    }

    fn create_glow_window(&self, owner: WindowHandle, edge: GlowEdge) -> ChromeResult<WindowHandle> {
        Self::ensure_glow_class()?;
        let instance = unsafe { GetModuleHandleW(None) }
            .map_err(|err| platform_error("GetModuleHandleW", err))?;
        let glow = unsafe {
            CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
                GLOW_CLASS,
                PCWSTR::null(),
                WS_POPUP,
                0,
                0,
                0,
                0,
                hwnd(owner),
                None,
                instance,
                None,
            )
        }
        .map_err(|err| platform_error("CreateWindowExW", err))?;
        tracing::trace!(target: targets::PLATFORM, ?edge, ?glow, "glow window created");
        handle_of(glow).ok_or(ChromeError::InvalidWindowHandle)
    }

    fn destroy_window(&self, window: WindowHandle) -> ChromeResult<()> {
        unsafe { DestroyWindow(hwnd(window)) }.map_err(|err| platform_error("DestroyWindow", err))
    }

    fn render_glow(&self, window: WindowHandle, appearance: &GlowAppearance) -> ChromeResult<()> {
        let size = appearance.size;
        if size.width <= 0 || size.height <= 0 {
            return Ok(());
        }
        let pixels = glow_pixels(appearance);

        unsafe {
            let screen = GetDC(None);
            let memory = CreateCompatibleDC(screen);
            let info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: size.width,
                    biHeight: -size.height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let mut bits: *mut c_void = std::ptr::null_mut();
            let bitmap = match CreateDIBSection(memory, &info, DIB_RGB_COLORS, &mut bits, None, 0) {
                Ok(bitmap) if !bits.is_null() => bitmap,
                Ok(bitmap) => {
                    let _ = DeleteObject(bitmap);
                    let _ = DeleteDC(memory);
                    ReleaseDC(None, screen);
                    return Err(ChromeError::platform("CreateDIBSection", "no pixel buffer"));
                }
                Err(err) => {
                    let _ = DeleteDC(memory);
                    ReleaseDC(None, screen);
                    return Err(platform_error("CreateDIBSection", err));
                }
            };
            std::ptr::copy_nonoverlapping(pixels.as_ptr(), bits as *mut u32, pixels.len());
            let previous = SelectObject(memory, bitmap);

            let native_size = SIZE {
                cx: size.width,
                cy: size.height,
            };
            let source = POINT::default();
            let blend = BLENDFUNCTION {
                BlendOp: AC_SRC_OVER as u8,
                BlendFlags: 0,
                SourceConstantAlpha: 255,
                AlphaFormat: AC_SRC_ALPHA as u8,
            };
            let result = UpdateLayeredWindow(
                hwnd(window),
                screen,
                None,
                Some(&native_size),
                memory,
                Some(&source),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            SelectObject(memory, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(memory);
            ReleaseDC(None, screen);
            result.map_err(|err| platform_error("UpdateLayeredWindow", err))
        }
    }

    fn post_system_command(&self, window: WindowHandle, command: SystemCommand) -> ChromeResult<()> {
        unsafe {
            PostMessageW(
                hwnd(window),
                WM_SYSCOMMAND,
                WPARAM(command_id(command) as usize),
                LPARAM(0),
            )
        }
        .map_err(|err| platform_error("PostMessageW", err))
    }

    fn track_system_menu(
        &self,
        window: WindowHandle,
        point: DevicePoint,
        state: &SystemMenuState,
    ) -> Option<SystemCommand> {
        let hwnd = hwnd(window);
        unsafe {
            let menu = GetSystemMenu(hwnd, FALSE);
            if menu.is_invalid() {
                tracing::warn!(target: targets::PLATFORM, ?window, "no system menu");
                return None;
            }
            let items = [
                (SystemCommand::Restore, state.restore),
                (SystemCommand::Move, state.move_window),
                (SystemCommand::Size, state.size),
                (SystemCommand::Minimize, state.minimize),
                (SystemCommand::Maximize, state.maximize),
                (SystemCommand::Close, state.close),
            ];
            for (command, enabled) in items {
                let flag = if enabled { MF_ENABLED } else { MF_GRAYED };
                let _ = EnableMenuItem(menu, command_id(command), MF_BYCOMMAND | flag);
            }
            let chosen = TrackPopupMenuEx(menu, TPM_RETURNCMD.0, point.x, point.y, hwnd, None);
            command_from_id(chosen.0 as u32)
        }
    }

    fn request_wakeup(&self, window: WindowHandle, after: Duration) {
        let millis = after.as_millis().clamp(1, u32::MAX as u128) as u32;
        unsafe { SetTimer(hwnd(window), WAKEUP_TIMER_ID, millis, None) };
    }
}

// ============================================================================
// Glow Pixels
// ============================================================================

/// Premultiplied BGRA pixels for a glow window, top row first.
///
/// Opacity falls off quadratically away from the main window. Corner
/// sections of the side glows fall off radially from the main window's
/// corner, or linearly along the edge.
fn glow_pixels(appearance: &GlowAppearance) -> Vec<u32> {
    let DeviceSize { width, height } = appearance.size;
    let depth = appearance.depth.max(1) as f64;
    let color = appearance.color;
    let mut pixels = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            // Distance from the main window along the glow's depth axis.
            let (across, along, length) = match appearance.edge {
                GlowEdge::Left => ((width - 1 - x) as f64, y as f64, height as f64),
                GlowEdge::Right => (x as f64, y as f64, height as f64),
                GlowEdge::Top => ((height - 1 - y) as f64, x as f64, width as f64),
                GlowEdge::Bottom => (y as f64, x as f64, width as f64),
            };
            let outside = if appearance.edge.is_horizontal() {
                0.0
            } else if along < depth {
                depth - along
            } else if along >= length - depth {
                along - (length - depth) + 1.0
            } else {
                0.0
            };
            let distance = if outside == 0.0 {
                across
            } else if appearance.radial_corners {
                (across * across + outside * outside).sqrt()
            } else {
                across.max(outside)
            };

            let falloff = (1.0 - distance / depth).clamp(0.0, 1.0);
            let alpha = color.a as f64 * falloff * falloff / 255.0;
            let premultiply = |channel: u8| (channel as f64 * alpha).round() as u32;
            pixels.push(
                ((alpha * 255.0).round() as u32) << 24
                    | premultiply(color.r) << 16
                    | premultiply(color.g) << 8
                    | premultiply(color.b),
            );
        }
    }
    pixels
}

// ============================================================================
// Attach
// ============================================================================

/// Attach chrome to the native window `raw_handle` and start routing its
/// messages.
pub fn attach(
    platform: Rc<Win32Platform>,
    builder: ChromeWindowBuilder,
    raw_handle: u64,
) -> ChromeResult<Rc<ChromeWindow>> {
    if let Some(existing) = CHROME_WINDOWS.with_borrow(|windows| {
        windows.get(&(raw_handle as usize)).and_then(Weak::upgrade)
    }) && existing.state().is_attached()
    {
        tracing::error!(target: targets::PLATFORM, raw_handle, "window already has chrome attached");
        return Err(ChromeError::AlreadyAttached(raw_handle));
    }

    let chrome = builder.attach(platform, raw_handle)?;
    let window = hwnd(chrome.window_handle());
    if !unsafe { SetWindowSubclass(window, Some(chrome_subclass_proc), SUBCLASS_ID, 0) }.as_bool() {
        chrome.detach();
        return Err(ChromeError::platform("SetWindowSubclass", "subclass installation failed"));
    }
    CHROME_WINDOWS.with_borrow_mut(|windows| {
        windows.insert(raw_handle as usize, Rc::downgrade(&chrome));
    });
    chrome.refresh_frame();
    Ok(chrome)
}

/// Attach chrome to a winit window.
pub fn attach_winit(
    window: &winit::window::Window,
    builder: ChromeWindowBuilder,
) -> ChromeResult<Rc<ChromeWindow>> {
    let handle = window.window_handle().map_err(|err| {
        tracing::error!(target: targets::PLATFORM, %err, "window handle unavailable");
        ChromeError::InvalidWindowHandle
    })?;
    match handle.as_raw() {
        RawWindowHandle::Win32(handle) => {
            attach(Rc::new(Win32Platform::new()), builder, handle.hwnd.get() as u64)
        }
        _ => {
            tracing::error!(target: targets::PLATFORM, "expected a Win32 window handle");
            Err(ChromeError::InvalidWindowHandle)
        }
    }
}

fn chrome_for(hwnd: HWND) -> Option<Rc<ChromeWindow>> {
    CHROME_WINDOWS.with_borrow(|windows| windows.get(&(hwnd.0 as usize)).and_then(Weak::upgrade))
}

// ============================================================================
// Message Translation
// ============================================================================

unsafe extern "system" fn chrome_subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _subclass_id: usize,
    _ref_data: usize,
) -> LRESULT {
    if msg == WM_NCDESTROY {
        if let Some(chrome) = chrome_for(hwnd) {
            chrome.detach();
        }
        CHROME_WINDOWS.with_borrow_mut(|windows| windows.remove(&(hwnd.0 as usize)));
        unsafe {
            let _ = RemoveWindowSubclass(hwnd, Some(chrome_subclass_proc), SUBCLASS_ID);
            return DefSubclassProc(hwnd, msg, wparam, lparam);
        }
    }

    let Some(chrome) = chrome_for(hwnd) else {
        return unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) };
    };
    unsafe { dispatch(&chrome, hwnd, msg, wparam, lparam) }
}

unsafe fn dispatch(
    chrome: &ChromeWindow,
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let default = || unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) };

    let reply = match msg {
        WM_NCCALCSIZE => {
            // With wparam set, the first rectangle of NCCALCSIZE_PARAMS is
            // the proposed window rect; otherwise lparam is a plain RECT.
            let rect = if wparam.0 != 0 {
                unsafe { &mut (*(lparam.0 as *mut NCCALCSIZE_PARAMS)).rgrc[0] }
            } else {
                unsafe { &mut *(lparam.0 as *mut RECT) }
            };
            match chrome.handle(ChromeMessage::NcCalcSize { proposed: device_rect(*rect) }) {
                Reply::ClientArea(client) => {
                    *rect = native_rect(client);
                    return LRESULT(0);
                }
                reply => reply,
            }
        }
        WM_NCHITTEST => chrome.handle(ChromeMessage::NcHitTest {
            point: point_from_lparam(lparam),
        }),
        WM_WINDOWPOSCHANGING => {
            let native = unsafe { &mut *(lparam.0 as *mut WINDOWPOS) };
            let pos = window_pos_from_native(native);
            match chrome.handle(ChromeMessage::WindowPosChanging { pos }) {
                Reply::WindowPos(changed) => {
                    native.x = changed.rect.left;
                    native.y = changed.rect.top;
                    native.cx = changed.rect.width();
                    native.cy = changed.rect.height();
                    native.flags = SET_WINDOW_POS_FLAGS(changed.flags.bits());
                    return LRESULT(0);
                }
                reply => reply,
            }
        }
        WM_WINDOWPOSCHANGED => {
            let pos = window_pos_from_native(unsafe { &*(lparam.0 as *const WINDOWPOS) });
            chrome.handle(ChromeMessage::WindowPosChanged { pos })
        }
        WM_GETMINMAXINFO => {
            let native = unsafe { &mut *(lparam.0 as *mut MINMAXINFO) };
            let info = MinMaxInfo {
                max_position: DevicePoint::new(native.ptMaxPosition.x, native.ptMaxPosition.y),
                max_size: DeviceSize::new(native.ptMaxSize.x, native.ptMaxSize.y),
                min_track_size: DeviceSize::new(native.ptMinTrackSize.x, native.ptMinTrackSize.y),
                max_track_size: DeviceSize::new(native.ptMaxTrackSize.x, native.ptMaxTrackSize.y),
            };
            match chrome.handle(ChromeMessage::GetMinMaxInfo { info }) {
                Reply::MinMaxInfo(info) => {
                    native.ptMaxPosition = POINT { x: info.max_position.x, y: info.max_position.y };
                    native.ptMaxSize = POINT { x: info.max_size.width, y: info.max_size.height };
                    native.ptMinTrackSize = POINT {
                        x: info.min_track_size.width,
                        y: info.min_track_size.height,
                    };
                    native.ptMaxTrackSize = POINT {
                        x: info.max_track_size.width,
                        y: info.max_track_size.height,
                    };
                    return LRESULT(0);
                }
                reply => reply,
            }
        }
        WM_STYLECHANGING if wparam.0 as i32 == GWL_STYLE.0 => {
            let native = unsafe { &mut *(lparam.0 as *mut STYLESTRUCT) };
            let old = WindowStyle::from_bits(native.styleOld);
            let new = WindowStyle::from_bits(native.styleNew);
            match chrome.handle(ChromeMessage::StyleChanging { old, new }) {
                Reply::Style(style) => {
                    native.styleNew = style.bits();
                    return LRESULT(0);
                }
                reply => reply,
            }
        }
        WM_SIZE => {
            let kind = match wparam.0 {
                SIZE_RESTORED => Some(SizeKind::Restored),
                SIZE_MINIMIZED => Some(SizeKind::Minimized),
                SIZE_MAXIMIZED => Some(SizeKind::Maximized),
                _ => None,
            };
            match kind {
                Some(kind) => chrome.handle(ChromeMessage::Size { kind }),
                None => Reply::Unhandled,
            }
        }
        WM_ERASEBKGND => chrome.handle(ChromeMessage::EraseBackground),
        WM_PAINT => chrome.handle(ChromeMessage::Paint),
        WM_NCACTIVATE => chrome.handle(ChromeMessage::NcActivate { active: wparam.0 != 0 }),
        WM_ACTIVATE => chrome.handle(ChromeMessage::Activate {
            active: wparam.0 & 0xFFFF != 0,
        }),
        WM_ENTERSIZEMOVE => chrome.handle(ChromeMessage::EnterSizeMove),
        WM_EXITSIZEMOVE => chrome.handle(ChromeMessage::ExitSizeMove),
        WM_NCMOUSEMOVE => {
            let mut track = TRACKMOUSEEVENT {
                cbSize: size_of::<TRACKMOUSEEVENT>() as u32,
                dwFlags: TME_LEAVE | TME_NONCLIENT,
                hwndTrack: hwnd,
                dwHoverTime: 0,
            };
            let _ = unsafe { TrackMouseEvent(&mut track) };
            chrome.handle(ChromeMessage::NcMouseMove { point: point_from_lparam(lparam) })
        }
        WM_NCMOUSELEAVE => chrome.handle(ChromeMessage::NcMouseLeave),
        WM_NCLBUTTONDOWN => chrome.handle(ChromeMessage::NcLeftButtonDown {
            point: point_from_lparam(lparam),
        }),
        WM_NCLBUTTONUP => chrome.handle(ChromeMessage::NcLeftButtonUp {
            point: point_from_lparam(lparam),
        }),
        WM_NCRBUTTONUP => chrome.handle(ChromeMessage::NcRightButtonUp {
            point: point_from_lparam(lparam),
        }),
        WM_SETTEXT | WM_SETICON => chrome.handle(ChromeMessage::CaptionTextOrIconChanged),
        WM_DPICHANGED => {
            let dpi = ((wparam.0 >> 16) & 0xFFFF) as u32;
            let suggested = device_rect(unsafe { *(lparam.0 as *const RECT) });
            chrome.handle(ChromeMessage::DpiChanged {
                scale: DpiScale::from_dpi(dpi),
                suggested,
            })
        }
        WM_SHOWWINDOW => chrome.handle(ChromeMessage::ShowWindow { visible: wparam.0 != 0 }),
        WM_TIMER if wparam.0 == WAKEUP_TIMER_ID => {
            let _ = unsafe { KillTimer(hwnd, WAKEUP_TIMER_ID) };
            chrome.handle(ChromeMessage::Timer)
        }
        WM_DESTROY => chrome.handle(ChromeMessage::Destroy),
        _ => Reply::Unhandled,
    };

    match reply {
        Reply::Unhandled => default(),
        Reply::HitTest(result) => LRESULT(hit_test_code(result)),
        Reply::BackgroundErased => LRESULT(1),
        Reply::SuppressNcRepaint => unsafe { DefSubclassProc(hwnd, msg, wparam, LPARAM(-1)) },
        Reply::DefaultWithoutRedraw => unsafe { default_without_redraw(hwnd, msg, wparam, lparam) },
        Reply::Cursor(icon) => {
            set_cursor(icon);
            LRESULT(1)
        }
        Reply::NoActivate => LRESULT(MA_NOACTIVATE),
        _ => LRESULT(0),
    }
}

/// Run default handling with the visible bit cleared so it cannot paint.
unsafe fn default_without_redraw(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        let style = GetWindowLongW(hwnd, GWL_STYLE);
        SetWindowLongW(hwnd, GWL_STYLE, style & !(WS_VISIBLE.0 as i32));
        let result = DefSubclassProc(hwnd, msg, wparam, lparam);
        SetWindowLongW(hwnd, GWL_STYLE, style);
        result
    }
}

fn set_cursor(icon: CursorIcon) {
    let id = match icon {
        CursorIcon::NsResize => IDC_SIZENS,
        CursorIcon::EwResize => IDC_SIZEWE,
        CursorIcon::NwseResize => IDC_SIZENWSE,
        CursorIcon::NeswResize => IDC_SIZENESW,
        _ => IDC_ARROW,
    };
    if let Ok(cursor) = unsafe { LoadCursorW(None, id) } {
        unsafe { SetCursor(cursor) };
    }
}

unsafe extern "system" fn glow_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let default = || unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };

    let message = match msg {
        WM_MOUSEACTIVATE => Some(GlowMessage::MouseActivate),
        WM_NCHITTEST => Some(GlowMessage::NcHitTest { point: point_from_lparam(lparam) }),
        WM_SETCURSOR => cursor_point().map(|point| GlowMessage::SetCursor { point }),
        WM_LBUTTONDOWN => cursor_point().map(|point| GlowMessage::LeftButtonDown { point }),
        WM_DESTROY => Some(GlowMessage::Destroyed),
        _ => None,
    };
    let Some(message) = message else {
        return default();
    };

    let owner = unsafe { GetWindow(hwnd, GW_OWNER) }.ok();
    let chrome = owner.and_then(chrome_for);
    let reply = match (chrome, handle_of(hwnd)) {
        (Some(chrome), Some(glow)) => chrome.handle_glow_message(glow, message),
        _ => None,
    };

    match reply {
        Some(Reply::NoActivate) => LRESULT(MA_NOACTIVATE),
        Some(Reply::HitTest(result)) => LRESULT(hit_test_code(result)),
        Some(Reply::Cursor(icon)) => {
            set_cursor(icon);
            LRESULT(1)
        }
        Some(Reply::Handled) => LRESULT(0),
        _ => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_from_lparam_is_signed() {
        let lparam = LPARAM(((0xFFF6u32 << 16) | 0xFFFB) as isize);
        assert_eq!(point_from_lparam(lparam), DevicePoint::new(-5, -10));
    }

    #[test]
    fn test_command_ids_roundtrip() {
        for command in [
            SystemCommand::Minimize,
            SystemCommand::Maximize,
            SystemCommand::Restore,
            SystemCommand::Close,
            SystemCommand::Move,
            SystemCommand::Size,
        ] {
            assert_eq!(command_from_id(command_id(command)), Some(command));
        }
    }

    #[test]
    fn test_glow_fades_outward() {
        let appearance = GlowAppearance {
            edge: GlowEdge::Bottom,
            size: DeviceSize::new(4, 8),
            depth: 8,
            color: Color::from_rgb8(0, 0x7A, 0xCC),
            radial_corners: true,
        };
        let pixels = glow_pixels(&appearance);
        let alpha = |row: usize| pixels[row * 4] >> 24;
        assert_eq!(alpha(0), 255);
        assert!(alpha(3) < alpha(1));
        assert!(alpha(7) < 10);
    }
}
