use prism_core::camera::OrbitController;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Radians of orbit per pixel of drag.
const ROTATE_SPEED: f32 = 0.01;
/// Radius factor per scroll line.
const ZOOM_STEP: f32 = 0.95;
const PIXELS_PER_LINE: f32 = 50.0;

/// Turns mouse drags and scrolling into orbit camera moves.
#[derive(Debug, Default)]
pub struct OrbitInput {
    dragging: bool,
    cursor: Option<(f64, f64)>,
}

impl OrbitInput {
    pub fn handle(&mut self, event: &WindowEvent, camera: &mut OrbitController) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => self.set_dragging(*state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x, position.y, camera)
            }
            WindowEvent::CursorLeft { .. } => self.set_dragging(false),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                scroll(lines, camera);
            }
            _ => {}
        }
    }

    fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    fn cursor_moved(&mut self, x: f64, y: f64, camera: &mut OrbitController) {
        if let Some((last_x, last_y)) = self.cursor {
            if self.dragging {
                let dx = (x - last_x) as f32;
                let dy = (y - last_y) as f32;
                camera.rotate(-dx * ROTATE_SPEED, -dy * ROTATE_SPEED);
            }
        }
        self.cursor = Some((x, y));
    }
}

/// Scrolling up (positive) moves closer.
fn scroll(lines: f32, camera: &mut OrbitController) {
    if lines != 0.0 {
        camera.zoom(ZOOM_STEP.powf(lines));
    }
}

#[cfg(test)]
mod tests {
    use prism_core::{camera::OrbitController, glam::Vec3};

    use super::{OrbitInput, scroll};

    #[test]
    fn moving_without_drag_only_tracks_the_cursor() {
        let mut input = OrbitInput::default();
        let mut camera = OrbitController::default();
        let before = camera.position();

        input.cursor_moved(10.0, 10.0, &mut camera);
        input.cursor_moved(60.0, 10.0, &mut camera);
        camera.update();

        assert!(camera.position().abs_diff_eq(before, 1e-4));
    }

    #[test]
    fn drag_orbits_at_constant_distance() {
        let mut input = OrbitInput::default();
        let mut camera = OrbitController::default();
        let distance = camera.distance();

        input.cursor_moved(10.0, 10.0, &mut camera);
        input.set_dragging(true);
        input.cursor_moved(60.0, 10.0, &mut camera);
        camera.update();

        assert_ne!(camera.position(), Vec3::new(0.0, 0.0, distance));
        assert!((camera.distance() - distance).abs() < 1e-4);
    }

    #[test]
    fn scrolling_up_zooms_in() {
        let mut camera = OrbitController::default();
        let distance = camera.distance();

        scroll(2.0, &mut camera);
        assert!(camera.distance() < distance);
        scroll(-4.0, &mut camera);
        assert!(camera.distance() > distance);
    }
}
