use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Per-frame keyboard and mouse state.
///
/// Key presses and clicks are kept in arrival order so that two quick presses
/// within one frame are both delivered, in sequence.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: Vec<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    clicks: Vec<Vec2>,
    mouse_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.clicks.clear();
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
            }
            _ => {}
        }
    }

    /// Record a key press. Auto-repeat while held does not count again.
    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_down.insert(key) {
            self.keys_pressed.push(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    /// Record a mouse press at the current cursor position. Only the left
    /// button clicks.
    pub fn press_button(&mut self, button: MouseButton) {
        if self.mouse_buttons_down.insert(button) && button == MouseButton::Left {
            self.clicks.push(self.mouse_position);
        }
    }

    pub fn move_cursor(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Keys pressed this frame, oldest first.
    pub fn keys_pressed(&self) -> &[KeyCode] {
        &self.keys_pressed
    }

    /// Left clicks this frame, oldest first.
    pub fn clicks(&self) -> &[Vec2] {
        &self.clicks
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presses_keep_arrival_order_and_ignore_repeat() {
        let mut input = Input::new();
        input.press_key(KeyCode::ArrowRight);
        input.press_key(KeyCode::ArrowRight);
        input.release_key(KeyCode::ArrowRight);
        input.press_key(KeyCode::ArrowRight);
        input.press_key(KeyCode::ArrowLeft);
        assert_eq!(
            input.keys_pressed(),
            &[KeyCode::ArrowRight, KeyCode::ArrowRight, KeyCode::ArrowLeft]
        );

        input.begin_frame();
        assert!(input.keys_pressed().is_empty());
        assert!(input.key_down(KeyCode::ArrowLeft));
    }

    #[test]
    fn clicks_record_cursor_position() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(10.0, 20.0));
        input.press_button(MouseButton::Left);
        input.press_button(MouseButton::Right);
        assert_eq!(input.clicks(), &[Vec2::new(10.0, 20.0)]);
    }
}
