//! System commands and the system menu.

use horizon_chrome_core::logging::targets;
use horizon_chrome_core::{ChromeResult, DevicePoint, WindowHandle, WindowState};

use crate::config::ChromeConfig;
use crate::hit_test::HitTestResult;
use crate::platform::WindowPlatform;

/// A native window command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCommand {
    Minimize,
    Maximize,
    Restore,
    Close,
    /// Start a keyboard move.
    Move,
    /// Start a keyboard size.
    Size,
}

impl SystemCommand {
    /// The command a custom caption button performs in `state`.
    pub fn for_button(button: HitTestResult, state: WindowState) -> Option<SystemCommand> {
        match button {
            HitTestResult::MinimizeButton => Some(SystemCommand::Minimize),
            HitTestResult::MaximizeButton if state.is_maximized() => Some(SystemCommand::Restore),
            HitTestResult::MaximizeButton => Some(SystemCommand::Maximize),
            HitTestResult::CloseButton => Some(SystemCommand::Close),
            _ => None,
        }
    }
}

/// Enablement of the system menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMenuState {
    pub restore: bool,
    pub move_window: bool,
    pub size: bool,
    pub minimize: bool,
    pub maximize: bool,
    pub close: bool,
}

impl SystemMenuState {
    /// Compute item enablement for a window.
    pub fn compute(state: WindowState, config: &ChromeConfig, resizable: bool) -> Self {
        let normal = state.is_normal();
        Self {
            restore: !normal && (config.enable_maximize || state.is_minimized()),
            move_window: normal,
            size: normal && resizable,
            minimize: config.enable_minimize && !state.is_minimized(),
            maximize: config.enable_maximize && resizable && !state.is_maximized(),
            close: true,
        }
    }

    /// Check if `command` is enabled.
    pub fn allows(&self, command: SystemCommand) -> bool {
        match command {
            SystemCommand::Minimize => self.minimize,
            SystemCommand::Maximize => self.maximize,
            SystemCommand::Restore => self.restore,
            SystemCommand::Close => self.close,
            SystemCommand::Move => self.move_window,
            SystemCommand::Size => self.size,
        }
    }
}

/// Posts system commands and opens the system menu for one window.
pub struct SystemCommandBridge<'a> {
    platform: &'a dyn WindowPlatform,
    window: WindowHandle,
    menu: SystemMenuState,
}

impl<'a> SystemCommandBridge<'a> {
    pub fn new(
        platform: &'a dyn WindowPlatform,
        window: WindowHandle,
        state: WindowState,
        config: &ChromeConfig,
        resizable: bool,
    ) -> Self {
        Self {
            platform,
            window,
            menu: SystemMenuState::compute(state, config, resizable),
        }
    }

    pub fn menu_state(&self) -> &SystemMenuState {
        &self.menu
    }

    /// Post `command` if it is enabled.
    ///
    /// Returns `Ok(false)` when the command is disabled by configuration or
    /// window state.
    pub fn post(&self, command: SystemCommand) -> ChromeResult<bool> {
        if !self.menu.allows(command) {
            tracing::debug!(
                target: targets::SYSTEM_MENU,
                window = ?self.window,
                ?command,
                "system command disabled"
            );
            return Ok(false);
        }
        tracing::debug!(target: targets::SYSTEM_MENU, window = ?self.window, ?command, "posting system command");
        self.platform.post_system_command(self.window, command)?;
        Ok(true)
    }

    /// Show the system menu at `point` and post the chosen command.
    pub fn show_menu(&self, point: DevicePoint) -> ChromeResult<Option<SystemCommand>> {
        tracing::trace!(target: targets::SYSTEM_MENU, ?point, menu = ?self.menu, "showing system menu");
        match self.platform.track_system_menu(self.window, point, &self.menu) {
            Some(command) if self.post(command)? => Ok(Some(command)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_commands() {
        use HitTestResult::*;
        let normal = WindowState::Normal;
        let maximized = WindowState::Maximized;
        assert_eq!(SystemCommand::for_button(MinimizeButton, normal), Some(SystemCommand::Minimize));
        assert_eq!(SystemCommand::for_button(MaximizeButton, normal), Some(SystemCommand::Maximize));
        assert_eq!(SystemCommand::for_button(MaximizeButton, maximized), Some(SystemCommand::Restore));
        assert_eq!(SystemCommand::for_button(CloseButton, maximized), Some(SystemCommand::Close));
        assert_eq!(SystemCommand::for_button(Caption, normal), None);
    }

    #[test]
    fn test_menu_state_normal() {
        let menu = SystemMenuState::compute(WindowState::Normal, &ChromeConfig::default(), true);
        assert!(!menu.restore);
        assert!(menu.move_window && menu.size && menu.minimize && menu.maximize && menu.close);
    }

    #[test]
    fn test_menu_state_maximized() {
        let menu = SystemMenuState::compute(WindowState::Maximized, &ChromeConfig::default(), true);
        assert!(menu.restore);
        assert!(!menu.move_window && !menu.size && !menu.maximize);
        assert!(menu.minimize);
    }

    #[test]
    fn test_menu_state_respects_config() {
        let config = ChromeConfig::new()
            .with_enable_minimize(false)
            .with_enable_maximize(false);
        let menu = SystemMenuState::compute(WindowState::Normal, &config, true);
        assert!(!menu.allows(SystemCommand::Minimize));
        assert!(!menu.allows(SystemCommand::Maximize));
        assert!(menu.allows(SystemCommand::Close));

        let menu = SystemMenuState::compute(WindowState::Minimized, &config, true);
        assert!(menu.allows(SystemCommand::Restore));
    }

    #[test]
    fn test_menu_state_not_resizable() {
        let menu = SystemMenuState::compute(WindowState::Normal, &ChromeConfig::default(), false);
        assert!(!menu.size);
        assert!(!menu.maximize);
        assert!(menu.move_window);
    }
}
