use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use terrascape_common::{ConfigError, ensure_finite, ensure_positive};

/// Pitch is clamped to ±this many degrees so `up` never flips.
pub const PITCH_LIMIT: f32 = 89.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

const DEFAULT_YAW: f32 = -90.0;
const DEFAULT_PITCH: f32 = 0.0;

/// One of the six movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Tunable camera settings, as supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees, exclusive range (0, 180).
    pub fov_degrees: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per pointer unit.
    pub sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            speed: 5.0,
            sensitivity: 0.1,
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fov = ensure_positive("fov_degrees", self.fov_degrees)?;
        if fov >= 180.0 {
            return Err(ConfigError::OutOfRange {
                field: "fov_degrees",
                value: fov,
                min: 0.0,
                max: 180.0,
            });
        }
        ensure_positive("camera speed", self.speed)?;
        ensure_positive("mouse sensitivity", self.sensitivity)?;
        Ok(())
    }
}

/// Free-fly camera parameterized by yaw and pitch (degrees), no roll.
///
/// WASD-style movement stays on the ground plane regardless of where the
/// camera looks; Up/Down move along world Y only.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    fov: f32,
    aspect: f32,
    speed: f32,
    sensitivity: f32,
    first_mouse: bool,
    defaults: CameraSettings,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let defaults = CameraSettings::default();
        let mut camera = Self {
            position,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            fov: defaults.fov_degrees.to_radians(),
            aspect: 1.0,
            speed: defaults.speed,
            sensitivity: defaults.sensitivity,
            first_mouse: true,
            defaults,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_settings(position: Vec3, settings: CameraSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        ensure_finite("camera position", position.x)?;
        ensure_finite("camera position", position.y)?;
        ensure_finite("camera position", position.z)?;
        let mut camera = Self::new(position);
        camera.defaults = settings;
        camera.apply_settings(settings);
        Ok(camera)
    }

    fn apply_settings(&mut self, settings: CameraSettings) {
        self.fov = settings.fov_degrees.to_radians();
        self.speed = settings.speed;
        self.sensitivity = settings.sensitivity;
    }

    /// Translate by `speed * dt` along `direction`.
    pub fn move_in(&mut self, direction: Direction, dt: f32) {
        let distance = self.speed * dt;
        // `right` is horizontal by construction; forward is rebuilt from it so
        // looking up or down never tilts ground movement.
        let right = Vec3::new(self.right.x, 0.0, self.right.z).normalize_or_zero();
        let forward = Vec3::Y.cross(right);

        match direction {
            Direction::Forward => self.position += forward * distance,
            Direction::Backward => self.position -= forward * distance,
            Direction::Left => self.position -= right * distance,
            Direction::Right => self.position += right * distance,
            Direction::Up => self.position.y += distance,
            Direction::Down => self.position.y -= distance,
        }
    }

    /// Apply a pointer delta. Positive `dy` pitches up.
    ///
    /// Non-finite input is dropped so the orientation can never become NaN.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let dx = dx * self.sensitivity;
        let dy = dy * self.sensitivity;
        if !dx.is_finite() || !dy.is_finite() {
            tracing::debug!(dx, dy, "ignoring non-finite rotation");
            return;
        }

        self.yaw = wrap_degrees(self.yaw + dx);
        self.pitch = (self.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(Vec3::Y).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Aspect from a framebuffer size. Zero height is treated as one pixel.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), ConfigError> {
        self.speed = ensure_positive("camera speed", speed)?;
        Ok(())
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) -> Result<(), ConfigError> {
        self.sensitivity = ensure_positive("mouse sensitivity", sensitivity)?;
        Ok(())
    }

    pub fn is_first_mouse(&self) -> bool {
        self.first_mouse
    }

    pub fn unset_first_mouse(&mut self) {
        self.first_mouse = false;
    }

    /// Re-arm the first-mouse flag, e.g. when pointer tracking restarts.
    pub fn reset_first_mouse(&mut self) {
        self.first_mouse = true;
    }

    /// Restore speed, sensitivity, and field of view to the configured defaults.
    pub fn reset_settings(&mut self) {
        self.apply_settings(self.defaults);
    }
}

/// Keep yaw in [-180, 180) so long sessions do not lose precision.
fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(cam: &Camera) {
        let (f, r, u) = (cam.front(), cam.right(), cam.up());
        assert!(f.dot(r).abs() < EPS, "front·right = {}", f.dot(r));
        assert!(f.dot(u).abs() < EPS, "front·up = {}", f.dot(u));
        assert!(r.dot(u).abs() < EPS, "right·up = {}", r.dot(u));
        for v in [f, r, u] {
            assert!((v.length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let cam = Camera::default();
        assert_eq!(cam.yaw(), -90.0);
        assert_eq!(cam.pitch(), 0.0);
        assert!((cam.front() - Vec3::NEG_Z).length() < EPS);
        assert!((cam.right() - Vec3::X).length() < EPS);
        assert!((cam.up() - Vec3::Y).length() < EPS);
        assert!(cam.is_first_mouse());
    }

    #[test]
    fn default_settings() {
        let cam = Camera::default();
        assert_eq!(cam.speed(), 5.0);
        assert_eq!(cam.sensitivity(), 0.1);
        assert!((cam.fov() - 45.0_f32.to_radians()).abs() < 1e-7);
        assert_eq!(cam.aspect(), 1.0);
    }

    #[test]
    fn move_up_adds_exactly_speed_times_dt() {
        let mut cam = Camera::new(Vec3::new(1.5, 0.0, -2.0));
        cam.move_in(Direction::Up, 1.0);
        assert_eq!(cam.position(), Vec3::new(1.5, 5.0, -2.0));
        cam.move_in(Direction::Down, 0.5);
        assert_eq!(cam.position(), Vec3::new(1.5, 2.5, -2.0));
    }

    #[test]
    fn horizontal_moves_keep_height() {
        let mut cam = Camera::new(Vec3::new(0.0, 3.0, 0.0));
        let deltas = [(13.0, 400.0), (-250.0, -900.0), (77.0, 123.0), (5000.0, 5.0)];
        for (dx, dy) in deltas {
            cam.rotate(dx, dy);
            for dir in [
                Direction::Forward,
                Direction::Backward,
                Direction::Left,
                Direction::Right,
            ] {
                cam.move_in(dir, 0.37);
                assert_eq!(cam.position().y, 3.0);
            }
        }
    }

    #[test]
    fn vertical_moves_keep_x_and_z() {
        let mut cam = Camera::new(Vec3::new(4.0, 0.0, -7.0));
        cam.rotate(333.0, 250.0);
        cam.move_in(Direction::Up, 0.8);
        cam.move_in(Direction::Down, 0.3);
        assert_eq!(cam.position().x, 4.0);
        assert_eq!(cam.position().z, -7.0);
    }

    #[test]
    fn forward_ignores_pitch() {
        let mut level = Camera::default();
        let mut tilted = Camera::default();
        tilted.rotate(0.0, 800.0);
        level.move_in(Direction::Forward, 1.0);
        tilted.move_in(Direction::Forward, 1.0);
        assert!((level.position() - tilted.position()).length() < EPS);
        assert!((level.position() - Vec3::new(0.0, 0.0, -5.0)).length() < EPS);
    }

    #[test]
    fn strafe_follows_right_vector() {
        let mut cam = Camera::default();
        cam.move_in(Direction::Right, 1.0);
        assert!((cam.position() - Vec3::new(5.0, 0.0, 0.0)).length() < EPS);
        cam.move_in(Direction::Left, 2.0);
        assert!((cam.position() - Vec3::new(-5.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn pitch_is_clamped_for_extreme_input() {
        let mut cam = Camera::default();
        cam.rotate(0.0, 1.0e9);
        assert_eq!(cam.pitch(), PITCH_LIMIT);
        cam.rotate(0.0, -1.0e9);
        assert_eq!(cam.pitch(), -PITCH_LIMIT);
        cam.rotate(f32::MAX, f32::MAX);
        assert!(cam.pitch() <= PITCH_LIMIT && cam.pitch() >= -PITCH_LIMIT);
        assert_orthonormal(&cam);
    }

    #[test]
    fn non_finite_rotation_is_ignored() {
        let mut cam = Camera::default();
        cam.rotate(10.0, 5.0);
        let (yaw, pitch) = (cam.yaw(), cam.pitch());
        cam.rotate(f32::NAN, 1.0);
        cam.rotate(1.0, f32::INFINITY);
        assert_eq!(cam.yaw(), yaw);
        assert_eq!(cam.pitch(), pitch);
        assert!(cam.front().is_finite());
    }

    #[test]
    fn basis_stays_orthonormal_over_many_rotations() {
        let mut cam = Camera::default();
        let mut state = 0x2545_f491_u32;
        for _ in 0..5_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let dx = (state % 2001) as f32 - 1000.0;
            let dy = ((state >> 11) % 2001) as f32 - 1000.0;
            cam.rotate(dx, dy);
            assert!(cam.pitch().abs() <= PITCH_LIMIT);
            assert_orthonormal(&cam);
        }
    }

    #[test]
    fn yaw_wraps_without_changing_direction() {
        let mut cam = Camera::default();
        let before = cam.front();
        cam.rotate(3600.0, 0.0); // ten full turns at sensitivity 0.1
        assert!((cam.yaw() - -90.0).abs() < 1e-3);
        assert!((cam.front() - before).length() < 1e-4);
    }

    #[test]
    fn view_projection_maps_target_to_screen_center() {
        let mut cam = Camera::new(Vec3::new(2.0, 1.0, 3.0));
        cam.set_aspect_ratio(1280, 720);
        let target = cam.position() + cam.front() * 10.0;
        let clip = cam.view_projection() * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn view_projection_is_projection_times_view() {
        let cam = Camera::new(Vec3::new(-1.0, 2.0, 0.5));
        assert_eq!(
            cam.view_projection(),
            cam.projection_matrix() * cam.view_matrix()
        );
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn aspect_ratio_from_framebuffer() {
        let mut cam = Camera::default();
        cam.set_aspect_ratio(1600, 900);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-6);
        cam.set_aspect_ratio(800, 0);
        assert_eq!(cam.aspect(), 800.0);
    }

    #[test]
    fn first_mouse_flag_round_trip() {
        let mut cam = Camera::default();
        cam.unset_first_mouse();
        assert!(!cam.is_first_mouse());
        cam.reset_first_mouse();
        assert!(cam.is_first_mouse());
    }

    #[test]
    fn reset_restores_configured_defaults() {
        let settings = CameraSettings {
            fov_degrees: 60.0,
            speed: 8.0,
            sensitivity: 0.2,
        };
        let mut cam = Camera::with_settings(Vec3::ZERO, settings).unwrap();
        cam.set_speed(20.0).unwrap();
        cam.set_sensitivity(1.0).unwrap();
        cam.reset_settings();
        assert_eq!(cam.speed(), 8.0);
        assert_eq!(cam.sensitivity(), 0.2);
    }

    #[test]
    fn settings_validation() {
        let bad_fov = CameraSettings {
            fov_degrees: 180.0,
            ..CameraSettings::default()
        };
        assert!(matches!(
            bad_fov.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
        let bad_speed = CameraSettings {
            speed: 0.0,
            ..CameraSettings::default()
        };
        assert!(Camera::with_settings(Vec3::ZERO, bad_speed).is_err());
        assert!(Camera::with_settings(Vec3::new(f32::NAN, 0.0, 0.0), CameraSettings::default()).is_err());
        let mut cam = Camera::default();
        assert!(cam.set_sensitivity(-1.0).is_err());
        assert_eq!(cam.sensitivity(), 0.1);
    }
}
