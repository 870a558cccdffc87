use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use terrascape_camera::{Camera, CameraSettings};
use terrascape_common::{ConfigError, Rgb};
use terrascape_noise::NoiseParameters;
use terrascape_terrain::{TerrainGrid, TerrainMesh};

use crate::light::PointLight;
use crate::scene::{CLEAR_COLOR, SceneError};
use crate::water::Water;

/// Startup configuration, usually read from YAML. Every section and field
/// is optional and falls back to the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub terrain: TerrainConfig,
    pub noise: NoiseConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub water: WaterConfig,
    pub clear_color: Rgb,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            noise: NoiseConfig::default(),
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            water: WaterConfig::default(),
            clear_color: CLEAR_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: f32,
    pub height: f32,
    pub subdivisions: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 15.0,
            height: 15.0,
            subdivisions: 256,
        }
    }
}

impl TerrainConfig {
    pub fn build(&self) -> Result<TerrainMesh, ConfigError> {
        TerrainMesh::new(self.width, self.height, self.subdivisions)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: i32,
    pub amplitude: f32,
    pub frequency: f32,
    pub gain: f32,
    pub lacunarity: f32,
    pub fudge: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let p = NoiseParameters::default();
        Self {
            seed: p.seed(),
            amplitude: p.amplitude(),
            frequency: p.frequency(),
            gain: p.gain(),
            lacunarity: p.lacunarity(),
            fudge: p.fudge(),
        }
    }
}

impl NoiseConfig {
    pub fn build(&self) -> Result<NoiseParameters, ConfigError> {
        NoiseParameters::new(
            self.seed,
            self.amplitude,
            self.frequency,
            self.gain,
            self.lacunarity,
            self.fudge,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let settings = CameraSettings::default();
        Self {
            position: Vec3::new(7.5, 1.5, 17.0),
            fov_degrees: settings.fov_degrees,
            speed: settings.speed,
            sensitivity: settings.sensitivity,
        }
    }
}

impl CameraConfig {
    pub fn settings(&self) -> CameraSettings {
        CameraSettings {
            fov_degrees: self.fov_degrees,
            speed: self.speed,
            sensitivity: self.sensitivity,
        }
    }

    pub fn build(&self) -> Result<Camera, ConfigError> {
        Camera::with_settings(self.position, self.settings())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: Vec3,
    pub color: Rgb,
}

impl Default for LightConfig {
    fn default() -> Self {
        let light = PointLight::default();
        Self {
            position: light.position(),
            color: light.color(),
        }
    }
}

impl LightConfig {
    pub fn build(&self) -> Result<PointLight, ConfigError> {
        PointLight::new(self.position, self.color)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub level: f32,
    pub color: Rgb,
    pub opacity: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        let water = Water::default();
        Self {
            level: water.level(),
            color: water.color(),
            opacity: water.opacity(),
        }
    }
}

impl WaterConfig {
    pub fn build(&self) -> Result<Water, ConfigError> {
        Water::new(self.level, self.color, self.opacity)
    }
}

impl SceneConfig {
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SceneError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check every section without allocating terrain geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        TerrainGrid::check_extents(
            self.terrain.width,
            self.terrain.height,
            self.terrain.subdivisions,
        )?;
        self.noise.build()?;
        self.camera.build()?;
        self.light.build()?;
        self.water.build()?;
        self.clear_color.validate("clear color")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.terrain.subdivisions, 256);
        assert_eq!(config.camera.position, Vec3::new(7.5, 1.5, 17.0));
        assert_eq!(config.noise.seed, 314159265);
        assert_eq!(config.clear_color, CLEAR_COLOR);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config = SceneConfig::from_yaml(
            "terrain:\n  subdivisions: 64\nnoise:\n  seed: 7\n  gain: 0.4\nwater:\n  opacity: 0.8\n",
        )
        .unwrap();
        assert_eq!(config.terrain.subdivisions, 64);
        assert_eq!(config.terrain.width, 15.0);
        assert_eq!(config.noise.seed, 7);
        assert_eq!(config.noise.gain, 0.4);
        assert_eq!(config.noise.lacunarity, 2.0);
        assert_eq!(config.water.opacity, 0.8);
        assert_eq!(config.water.level, 0.055);
        assert_eq!(config.light, LightConfig::default());
    }

    #[test]
    fn empty_document_is_default() {
        let config = SceneConfig::from_yaml("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = SceneConfig::default();
        config.camera.position = Vec3::new(1.0, 2.0, 3.0);
        config.light.color = Rgb::new(1.0, 0.5, 0.25);
        let text = config.to_yaml().unwrap();
        assert_eq!(SceneConfig::from_yaml(&text).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut config = SceneConfig::default();
        config.terrain.subdivisions = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSubdivisions));

        let mut config = SceneConfig::default();
        config.noise.amplitude = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { .. })
        ));

        let mut config = SceneConfig::default();
        config.camera.fov_degrees = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            SceneConfig::from_yaml("terrain: [1, 2"),
            Err(SceneError::Yaml(_))
        ));
        assert!(matches!(
            SceneConfig::from_yaml("terrain:\n  subdivisions: lots\n"),
            Err(SceneError::Yaml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "camera:\n  speed: 9.5\nclear_color: {{r: 0.0, g: 0.0, b: 0.2}}").unwrap();
        let config = SceneConfig::load(file.path()).unwrap();
        assert_eq!(config.camera.speed, 9.5);
        assert_eq!(config.clear_color, Rgb::new(0.0, 0.0, 0.2));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SceneConfig::load(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(SceneError::Io(_))));
    }
}
