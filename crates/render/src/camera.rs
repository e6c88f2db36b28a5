use cisco_common::CameraConfig;
use cisco_input::{Action, ActionState};
use glam::{DVec2, Mat4, Vec3};

/// Below this horizontal length the strafe direction is undefined and
/// strafing is skipped.
const STRAFE_EPSILON: f32 = 1e-6;

/// First-person camera driven by movement actions and pointer motion.
///
/// Yaw and pitch are in degrees. Pitch stays within `±pitch_limit` and the
/// forward vector is kept at unit length after every change.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    last_cursor: DVec2,
    first_sample: bool,
    speed: f32,
    sprint_multiplier: f32,
    sensitivity: f32,
    pitch_limit: f32,
    invert_y: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let pitch = config.pitch.clamp(-config.pitch_limit, config.pitch_limit);
        Self {
            position: config.position,
            forward: direction(config.yaw, pitch),
            up: Vec3::Y,
            yaw: config.yaw,
            pitch,
            last_cursor: DVec2::from_array(config.initial_cursor),
            first_sample: true,
            speed: config.speed,
            sprint_multiplier: config.sprint_multiplier,
            sensitivity: config.sensitivity,
            pitch_limit: config.pitch_limit,
            invert_y: config.invert_y,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Horizontal unit vector to the right of the view direction, or `None`
    /// when looking (nearly) straight up or down.
    pub fn right(&self) -> Option<Vec3> {
        let right = self.forward.cross(self.up);
        let horizontal = Vec3::new(right.x, 0.0, right.z);
        let len = horizontal.length();
        (len > STRAFE_EPSILON).then(|| horizontal / len)
    }

    /// Move according to the held actions over `delta_time` seconds.
    pub fn update(&mut self, input: &impl ActionState, delta_time: f32) {
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return;
        }

        let mut distance = self.speed * delta_time;
        if input.is_active(Action::Sprint) {
            distance *= self.sprint_multiplier;
        }

        let mut step = Vec3::ZERO;
        if input.is_active(Action::MoveForward) {
            step += self.forward;
        }
        if input.is_active(Action::MoveBackward) {
            step -= self.forward;
        }

        let strafe_right = input.is_active(Action::StrafeRight);
        let strafe_left = input.is_active(Action::StrafeLeft);
        if strafe_right || strafe_left {
            match self.right() {
                Some(right) => {
                    if strafe_right {
                        step += right;
                    }
                    if strafe_left {
                        step -= right;
                    }
                }
                None => tracing::trace!("strafe skipped: view is vertical"),
            }
        }

        if input.is_active(Action::Ascend) {
            step += self.up;
        }
        if input.is_active(Action::Descend) {
            step -= self.up;
        }

        self.position += step * distance;
    }

    /// Feed an absolute pointer position.
    ///
    /// The first sample only records the position so the view does not jump.
    /// Later samples turn the displacement into yaw/pitch.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        let cursor = DVec2::new(x, y);
        if self.first_sample {
            self.last_cursor = cursor;
            self.first_sample = false;
            return;
        }

        let dx = (cursor.x - self.last_cursor.x) as f32;
        // Screen y grows downward; moving the pointer up looks up.
        let mut dy = (self.last_cursor.y - cursor.y) as f32;
        if self.invert_y {
            dy = -dy;
        }
        self.last_cursor = cursor;

        self.rotate(dx * self.sensitivity, dy * self.sensitivity);
    }

    /// Turn by the given yaw/pitch deltas in degrees.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        if !(yaw_delta.is_finite() && pitch_delta.is_finite()) {
            return;
        }
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-self.pitch_limit, self.pitch_limit);
        self.forward = direction(self.yaw, self.pitch);
    }

    /// Forget the last pointer position; the next sample re-seeds it.
    pub fn reset_pointer(&mut self) {
        self.first_sample = true;
    }

    /// Right-handed world-to-view transform, column-major.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }
}

/// Unit direction for yaw/pitch in degrees. Yaw -90 looks down -Z.
fn direction(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cisco_input::InputState;

    const EPS: f32 = 1e-5;

    fn holding(actions: &[Action]) -> InputState {
        let mut input = InputState::new();
        for a in actions {
            input.press(*a);
        }
        input
    }

    #[test]
    fn default_pose() {
        let cam = Camera::default();
        assert_eq!(cam.position(), Vec3::new(0.0, 1.0, 3.0));
        assert!((cam.forward() - Vec3::NEG_Z).length() < EPS);
        assert_eq!(cam.yaw(), -90.0);
        assert_eq!(cam.pitch(), 0.0);
    }

    #[test]
    fn view_maps_eye_to_origin() {
        let mut cam = Camera::default();
        let samples = [(0.0, 0.0), (137.0, -40.0), (-900.0, 2500.0), (33.0, 12.0)];
        cam.on_pointer_move(400.0, 300.0);
        for (i, (x, y)) in samples.iter().enumerate() {
            cam.set_position(Vec3::new(i as f32 * 1.5, -2.0, 7.0 - i as f32));
            cam.on_pointer_move(*x, *y);
            let eye = cam.view_matrix().transform_point3(cam.position());
            assert!(eye.length() < 1e-4, "eye mapped to {eye:?}");
        }
    }

    #[test]
    fn view_looks_down_negative_z() {
        let cam = Camera::default();
        let ahead = cam.position() + cam.forward() * 2.0;
        let v = cam.view_matrix().transform_point3(ahead);
        assert!((v - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
    }

    #[test]
    fn first_pointer_sample_does_not_rotate() {
        let mut cam = Camera::default();
        let before = cam.forward();
        cam.on_pointer_move(10.0, 590.0);
        assert_eq!(cam.forward(), before);
        assert_eq!(cam.yaw(), -90.0);
    }

    #[test]
    fn pointer_motion_turns_by_sensitivity() {
        let mut cam = Camera::default();
        cam.on_pointer_move(400.0, 300.0);
        cam.on_pointer_move(450.0, 280.0);
        assert!((cam.yaw() - (-85.0)).abs() < EPS);
        // Pointer moved up 20px, so the view tilts up 2 degrees.
        assert!((cam.pitch() - 2.0).abs() < EPS);
    }

    #[test]
    fn invert_y_flips_pitch() {
        let mut cam = Camera::new(&CameraConfig {
            invert_y: true,
            ..CameraConfig::default()
        });
        cam.on_pointer_move(0.0, 0.0);
        cam.on_pointer_move(0.0, -20.0);
        assert!((cam.pitch() + 2.0).abs() < EPS);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.on_pointer_move(0.0, 0.0);
        for step in 1..50 {
            cam.on_pointer_move(0.0, -(step as f64) * 500.0);
            assert!(cam.pitch() <= 89.0 && cam.pitch() >= -89.0);
        }
        assert_eq!(cam.pitch(), 89.0);
        for step in 1..50 {
            cam.on_pointer_move(0.0, step as f64 * 1e6);
        }
        assert_eq!(cam.pitch(), -89.0);
    }

    #[test]
    fn forward_stays_unit_length() {
        let mut cam = Camera::default();
        let input = holding(&[Action::MoveForward, Action::StrafeRight]);
        cam.on_pointer_move(0.0, 0.0);
        for i in 0..200 {
            let t = i as f64;
            cam.on_pointer_move(t * 13.7, (t * 0.7).sin() * 900.0);
            cam.update(&input, 0.016);
            assert!((cam.forward().length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn forward_moves_along_view() {
        let mut cam = Camera::default();
        cam.update(&holding(&[Action::MoveForward]), 1.0);
        assert!((cam.position() - Vec3::new(0.0, 1.0, 0.5)).length() < 1e-4);
    }

    #[test]
    fn strafe_right_moves_positive_x_by_default() {
        let mut cam = Camera::default();
        cam.update(&holding(&[Action::StrafeRight]), 0.4);
        assert!((cam.position() - Vec3::new(1.0, 1.0, 3.0)).length() < 1e-4);
        cam.update(&holding(&[Action::StrafeLeft]), 0.4);
        assert!((cam.position() - Vec3::new(0.0, 1.0, 3.0)).length() < 1e-4);
    }

    #[test]
    fn strafe_stays_horizontal_when_pitched() {
        let mut cam = Camera::default();
        cam.rotate(0.0, 60.0);
        cam.update(&holding(&[Action::StrafeRight]), 1.0);
        assert!((cam.position().y - 1.0).abs() < EPS);
        assert!((cam.position().x - 2.5).abs() < 1e-4);
    }

    #[test]
    fn vertical_view_skips_strafe() {
        let mut cam = Camera::default();
        cam.forward = Vec3::Y;
        assert_eq!(cam.right(), None);
        cam.update(&holding(&[Action::StrafeLeft]), 1.0);
        assert_eq!(cam.position(), Vec3::new(0.0, 1.0, 3.0));
    }

    #[test]
    fn sprint_and_vertical_moves() {
        let mut cam = Camera::default();
        cam.update(&holding(&[Action::Ascend, Action::Sprint]), 1.0);
        assert!((cam.position().y - (1.0 + 2.5 * 3.0)).abs() < 1e-4);
        cam.update(&holding(&[Action::Descend]), 1.0);
        assert!((cam.position().y - (1.0 + 2.5 * 2.0)).abs() < 1e-4);
    }

    #[test]
    fn bad_delta_time_is_ignored() {
        let mut cam = Camera::default();
        let input = holding(&[Action::MoveForward]);
        cam.update(&input, f32::NAN);
        cam.update(&input, -1.0);
        assert_eq!(cam.position(), Vec3::new(0.0, 1.0, 3.0));
    }

    #[test]
    fn reset_pointer_reseeds() {
        let mut cam = Camera::default();
        cam.on_pointer_move(0.0, 0.0);
        cam.reset_pointer();
        cam.on_pointer_move(1000.0, 1000.0);
        assert_eq!(cam.yaw(), -90.0);
        assert_eq!(cam.pitch(), 0.0);
    }
}
