use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use terrascape_common::{ConfigError, Rgb, ensure_finite};

/// Vertical offset applied to the quad before `level` is added in the
/// water program.
pub const WATER_BASE_Y: f32 = -0.1;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct WaterVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Unit quad in the X-Z plane centred on the origin.
#[rustfmt::skip]
pub const QUAD_VERTICES: [WaterVertex; 4] = [
    WaterVertex { position: [ 0.5, 0.0,  0.5], uv: [1.0, 1.0] },
    WaterVertex { position: [ 0.5, 0.0, -0.5], uv: [1.0, 0.0] },
    WaterVertex { position: [-0.5, 0.0, -0.5], uv: [0.0, 0.0] },
    WaterVertex { position: [-0.5, 0.0,  0.5], uv: [0.0, 1.0] },
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Translucent water plane covering the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Water {
    level: f32,
    color: Rgb,
    opacity: f32,
}

impl Default for Water {
    fn default() -> Self {
        Self {
            level: 0.055,
            color: Rgb::from_u8(0, 188, 255),
            opacity: 0.6,
        }
    }
}

impl Water {
    pub fn new(level: f32, color: Rgb, opacity: f32) -> Result<Self, ConfigError> {
        let mut water = Self::default();
        water.set_level(level)?;
        water.set_color(color)?;
        water.set_opacity(opacity)?;
        Ok(water)
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_level(&mut self, level: f32) -> Result<(), ConfigError> {
        self.level = ensure_finite("water level", level)?;
        Ok(())
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<(), ConfigError> {
        color.validate("water color")?;
        self.color = color;
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f32) -> Result<(), ConfigError> {
        let opacity = ensure_finite("water opacity", opacity)?;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::OutOfRange {
                field: "water opacity",
                value: opacity,
                min: 0.0,
                max: 1.0,
            });
        }
        self.opacity = opacity;
        Ok(())
    }

    /// `translate(width/2, -0.1, height/2) * scale(width, 1, height)`.
    pub fn model_matrix(width: f32, height: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(width / 2.0, WATER_BASE_Y, height / 2.0))
            * Mat4::from_scale(Vec3::new(width, 1.0, height))
    }
}
