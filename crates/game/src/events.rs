//! Window and device event handling for GameState.

use winit::event::{DeviceEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

impl crate::GameState {
    /// Handle a window event. Returns true if the app should exit.
    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
                true
            }
            WindowEvent::Resized(size) => {
                self.resize(size.width, size.height);
                false
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return false;
                };
                self.input.process_keyboard(key, event.state);

                // Escape frees the cursor first and quits on the second press.
                if key == KeyCode::Escape && event.state.is_pressed() && !event.repeat {
                    if self.input.is_cursor_locked() {
                        self.grab_cursor(false);
                    } else {
                        log::info!("Escape pressed, exiting");
                        self.running = false;
                        return true;
                    }
                }
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                // The click that grabs the cursor is not a gameplay click.
                if state.is_pressed() && !self.input.is_cursor_locked() {
                    self.grab_cursor(true);
                    return false;
                }
                self.input.process_mouse_button(button, state);
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_cursor_position((position.x, position.y));
                false
            }
            WindowEvent::Focused(false) => {
                self.input.release_all();
                if self.input.is_cursor_locked() {
                    self.grab_cursor(false);
                }
                false
            }
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    log::error!("Render error: {}", e);
                }
                self.window.request_redraw();
                false
            }
            _ => false,
        }
    }

    /// Handle device events (e.g. raw mouse motion).
    pub(crate) fn handle_device_event(&mut self, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_motion(delta);
        }
    }
}
