use glam::Vec3;
use terrascape_common::{ConfigError, Rgb, ensure_finite};

const DEFAULT_POSITION: Vec3 = Vec3::new(3.0, 10.0, -4.0);

/// The scene's single point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    position: Vec3,
    color: Rgb,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            color: Rgb::WHITE,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Rgb) -> Result<Self, ConfigError> {
        let mut light = Self::default();
        light.set_position(position.x, position.y, position.z)?;
        light.set_color(color.r, color.g, color.b)?;
        Ok(light)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) -> Result<(), ConfigError> {
        self.position = Vec3::new(
            ensure_finite("light position", x)?,
            ensure_finite("light position", y)?,
            ensure_finite("light position", z)?,
        );
        Ok(())
    }

    /// Channels must lie in [0, 1].
    pub fn set_color(&mut self, r: f32, g: f32, b: f32) -> Result<(), ConfigError> {
        self.color = Rgb::try_new(r, g, b)?;
        Ok(())
    }

    /// White, at (3, 10, -4).
    pub fn reset_settings(&mut self) {
        *self = Self::default();
    }
}
