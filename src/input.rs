use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Tracks whether the user asked to leave the render loop.
#[derive(Debug, Default)]
pub struct InputState {
    pub exit_requested: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if is_exit_key(key, pressed) {
            self.exit_requested = true;
        }
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(key) = event.physical_key {
            self.handle_key(key, event.state == ElementState::Pressed);
        }
    }

    /// Updates from a window event; returns true once exit is requested.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => self.exit_requested = true,
            WindowEvent::KeyboardInput { event, .. } => self.handle_key_event(event),
            _ => {}
        }
        self.exit_requested
    }
}

pub fn is_exit_key(key: KeyCode, pressed: bool) -> bool {
    pressed && key == KeyCode::Escape
}
