//! Pointer input mapped onto [`CameraControls`]: left drag orbits, right drag
//! pans, the wheel zooms.

use depthview::CameraControls;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixels of trackpad scroll per wheel notch.
const PIXELS_PER_LINE: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Orbit,
    Pan,
}

#[derive(Debug, Default)]
pub struct InputController {
    drag: Option<Drag>,
    last_cursor: Option<(f64, f64)>,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a window event to `controls`. Returns true when the event was
    /// camera input.
    pub fn handle_event(
        &mut self,
        event: &WindowEvent,
        controls: &mut CameraControls,
        viewport_height: f32,
    ) -> bool {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                self.on_button(*button, *state == ElementState::Pressed)
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor((position.x, position.y), controls, viewport_height)
            }
            WindowEvent::CursorLeft { .. } => {
                self.drag = None;
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                controls.zoom(steps);
                true
            }
            _ => false,
        }
    }

    fn on_button(&mut self, button: MouseButton, pressed: bool) -> bool {
        let kind = match button {
            MouseButton::Left => Drag::Orbit,
            MouseButton::Right => Drag::Pan,
            _ => return false,
        };

        if pressed {
            self.drag = Some(kind);
        } else if self.drag == Some(kind) {
            self.drag = None;
        }
        true
    }

    fn on_cursor(
        &mut self,
        xy: (f64, f64),
        controls: &mut CameraControls,
        viewport_height: f32,
    ) -> bool {
        let last = self.last_cursor.replace(xy);
        let (Some(drag), Some(last)) = (self.drag, last) else {
            return false;
        };

        let dx = (xy.0 - last.0) as f32;
        let dy = (xy.1 - last.1) as f32;
        match drag {
            Drag::Orbit => controls.rotate(dx, dy, viewport_height),
            Drag::Pan => controls.pan(dx, dy, viewport_height),
        }
        true
    }
}
