//! Horizon Chrome Borderless Window Example
//!
//! Opens an undecorated winit window with custom chrome attached:
//! - Resize from the edges, corners and glow windows
//! - Drag and snap from the top 32 pixels
//! - Right-click the caption for the system menu
//!
//! Run with: cargo run -p horizon-chrome --example borderless
//! Filter logs with RUST_LOG, e.g. RUST_LOG=horizon_chrome=debug

#[cfg(target_os = "windows")]
mod app {
    use std::rc::Rc;

    use horizon_chrome::platform::win32;
    use horizon_chrome::prelude::*;
    use winit::application::ApplicationHandler;
    use winit::event::WindowEvent;
    use winit::event_loop::ActiveEventLoop;
    use winit::window::{Window, WindowId};

    /// Application state
    #[derive(Default)]
    pub struct App {
        window: Option<Window>,
        chrome: Option<Rc<ChromeWindow>>,
    }

    impl ApplicationHandler for App {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }

            let attrs = Window::default_attributes()
                .with_title("Horizon Chrome - Borderless")
                .with_inner_size(winit::dpi::LogicalSize::new(960.0, 640.0))
                .with_decorations(false);
            let window = event_loop.create_window(attrs).expect("Failed to create window");

            let config = ChromeConfig::new()
                .with_caption_height(32.0)
                .with_glow(GlowConfig::default().with_depth(10));
            let chrome = win32::attach_winit(&window, ChromeWindow::builder().with_config(config))
                .expect("Failed to attach chrome");
            tracing::info!(state = ?chrome.state(), "chrome attached");

            self.window = Some(window);
            self.chrome = Some(chrome);
        }

        fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            match event {
                WindowEvent::CloseRequested => {
                    if let Some(chrome) = self.chrome.take() {
                        chrome.detach();
                    }
                    event_loop.exit();
                }
                WindowEvent::Focused(focused) => {
                    if let Some(chrome) = &self.chrome {
                        chrome.on_activated(focused);
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Some(window) = &self.window {
                        window.pre_present_notify();
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let event_loop = winit::event_loop::EventLoop::new().expect("Failed to create event loop");
    let mut app = app::App::default();

    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("The borderless example requires Windows.");
}
