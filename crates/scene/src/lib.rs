//! Scene composition: terrain, water and light turned into draw calls.
//!
//! # Invariants
//! - Every frame is clear, then terrain (opaque), then water (blended).
//! - Light and camera are read-only while a frame is being drawn.
//! - Terrain is re-shaded only when the camera's X-Z offset or the noise
//!   parameters change.
//!
//! Drawing goes through [`GraphicsBackend`]. [`RecordingBackend`] captures
//! the command stream without a GPU; the wgpu implementation lives in
//! `terrascape-render-wgpu`.

mod backend;
mod config;
mod light;
mod recording;
mod scene;
mod water;

pub use backend::{
    BackendError, BlendMode, BufferHandle, DrawCall, GraphicsBackend, ProgramDesc, ProgramHandle,
    ProgramKind, ShaderStage, UniformKind, UniformValue, check_uniform,
};
pub use config::{
    CameraConfig, LightConfig, NoiseConfig, SceneConfig, TerrainConfig, WaterConfig,
};
pub use light::PointLight;
pub use recording::{Command, RecordingBackend};
pub use scene::{CLEAR_COLOR, FrameStats, Scene, SceneError};
pub use water::{Water, WaterVertex};
