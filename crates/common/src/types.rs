use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ensure_finite};

/// Linear RGB colour with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channel values (0..=255).
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Validated constructor: every channel must be finite and inside [0, 1].
    pub fn try_new(r: f32, g: f32, b: f32) -> Result<Self, ConfigError> {
        let rgb = Self::new(r, g, b);
        rgb.validate("color")?;
        Ok(rgb)
    }

    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        for value in [self.r, self.g, self.b] {
            ensure_finite(field, value)?;
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(())
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<Rgb> for Vec3 {
    fn from(c: Rgb) -> Self {
        c.to_vec3()
    }
}
