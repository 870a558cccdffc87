use glam::{Mat4, Vec2};
use terrascape_camera::Camera;
use terrascape_common::{ConfigError, Rgb};
use terrascape_noise::NoiseParameters;
use terrascape_terrain::{BiomeHistogram, ShadedVertex, TerrainMesh};

use crate::backend::{
    BackendError, BlendMode, BufferHandle, DrawCall, GraphicsBackend, ProgramDesc, ProgramHandle,
    ProgramKind, UniformValue,
};
use crate::config::SceneConfig;
use crate::light::PointLight;
use crate::water::{QUAD_INDICES, QUAD_VERTICES, Water};

pub const CLEAR_COLOR: Rgb = Rgb::new(0.1, 0.1, 0.1);

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// What one [`Scene::render`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Terrain heights were recomputed and re-uploaded this frame.
    pub reshaded: bool,
    pub terrain_vertices: u32,
    pub draw_calls: u32,
    pub histogram: BiomeHistogram,
}

#[derive(Debug)]
struct Programs {
    terrain: ProgramHandle,
    water: ProgramHandle,
}

#[derive(Debug)]
struct Buffers {
    terrain: BufferHandle,
    water_vertices: BufferHandle,
    water_indices: BufferHandle,
}

/// Terrain, water and light, composed into one frame of draw calls.
///
/// The terrain vertex stream is rebuilt only when the camera's X-Z position
/// or the noise parameters change; otherwise the previous upload is reused.
#[derive(Debug)]
pub struct Scene {
    mesh: TerrainMesh,
    noise: NoiseParameters,
    light: PointLight,
    water: Water,
    clear_color: Rgb,
    programs: Programs,
    buffers: Buffers,
    vertices: Vec<ShadedVertex>,
    shaded_origin: Option<Vec2>,
    dirty: bool,
    histogram: BiomeHistogram,
}

impl Scene {
    /// Build the scene and its GPU resources. Any compile failure is returned
    /// before a frame can be drawn.
    pub fn new<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        config: &SceneConfig,
    ) -> Result<Self, SceneError> {
        let _span = tracing::info_span!("scene_new").entered();
        config.validate()?;

        let mesh = config.terrain.build()?;
        let noise = config.noise.build()?;
        let light = config.light.build()?;
        let water = config.water.build()?;

        let programs = Programs {
            terrain: backend.compile_program(&ProgramDesc::new("terrain", ProgramKind::Terrain))?,
            water: backend.compile_program(&ProgramDesc::new("water", ProgramKind::Water))?,
        };

        let buffers = Buffers {
            terrain: backend.create_stream("terrain", stream_bytes(&mesh))?,
            water_vertices: backend
                .upload_vertices("water", bytemuck::cast_slice(&QUAD_VERTICES))?,
            water_indices: backend.upload_indices("water", &QUAD_INDICES)?,
        };

        tracing::info!(
            width = mesh.grid().width(),
            height = mesh.grid().height(),
            subdivisions = mesh.grid().subdivisions(),
            triangles = mesh.grid().triangle_count(),
            "scene ready"
        );

        Ok(Self {
            mesh,
            noise,
            light,
            water,
            clear_color: config.clear_color,
            programs,
            buffers,
            vertices: Vec::new(),
            shaded_origin: None,
            dirty: true,
            histogram: BiomeHistogram::default(),
        })
    }

    /// Draw one frame: clear, opaque terrain, then blended water.
    pub fn render<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        camera: &Camera,
    ) -> Result<FrameStats, SceneError> {
        let origin = Vec2::new(camera.position().x, camera.position().z);
        let reshaded = self.dirty || self.shaded_origin != Some(origin);
        if reshaded {
            self.reshade(backend, origin)?;
        }

        let vp = camera.view_projection();
        let light_pos = self.light.position();
        let light_color = self.light.color().to_vec3();
        let terrain = self.programs.terrain;
        let water = self.programs.water;
        let terrain_vertices = self.vertices.len() as u32;

        backend.begin_frame(self.clear_color)?;

        backend.set_uniform(terrain, "model", UniformValue::Mat4(Mat4::IDENTITY))?;
        backend.set_uniform(terrain, "vp", UniformValue::Mat4(vp))?;
        backend.set_uniform(terrain, "light_pos", UniformValue::Vec3(light_pos))?;
        backend.set_uniform(terrain, "light_color", UniformValue::Vec3(light_color))?;
        backend.draw(&DrawCall {
            program: terrain,
            vertices: self.buffers.terrain,
            indices: None,
            count: terrain_vertices,
            blend: BlendMode::Opaque,
            depth_write: true,
        })?;

        let grid = self.mesh.grid();
        let model = Water::model_matrix(grid.width(), grid.height());
        backend.set_uniform(water, "model", UniformValue::Mat4(model))?;
        backend.set_uniform(water, "vp", UniformValue::Mat4(vp))?;
        backend.set_uniform(water, "color", UniformValue::Vec3(self.water.color().to_vec3()))?;
        backend.set_uniform(water, "light_color", UniformValue::Vec3(light_color))?;
        backend.set_uniform(water, "water_level", UniformValue::Float(self.water.level()))?;
        backend.set_uniform(water, "opacity", UniformValue::Float(self.water.opacity()))?;
        backend.draw(&DrawCall {
            program: water,
            vertices: self.buffers.water_vertices,
            indices: Some(self.buffers.water_indices),
            count: QUAD_INDICES.len() as u32,
            blend: BlendMode::Alpha,
            depth_write: false,
        })?;

        backend.end_frame()?;

        let stats = FrameStats {
            reshaded,
            terrain_vertices,
            draw_calls: 2,
            histogram: self.histogram,
        };
        tracing::trace!(?stats, "frame");
        Ok(stats)
    }

    fn reshade<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        origin: Vec2,
    ) -> Result<(), SceneError> {
        self.histogram = self.mesh.shade_into(&self.noise, origin, &mut self.vertices);
        backend.update_stream(self.buffers.terrain, bytemuck::cast_slice(&self.vertices))?;
        self.shaded_origin = Some(origin);
        self.dirty = false;
        tracing::debug!(x = origin.x, z = origin.y, histogram = %self.histogram, "terrain reshaded");
        Ok(())
    }

    /// Rebuild the grid and reallocate the terrain stream. On error the
    /// scene is unchanged.
    pub fn resize_terrain<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: f32,
        height: f32,
        subdivisions: u32,
    ) -> Result<(), SceneError> {
        let mesh = TerrainMesh::new(width, height, subdivisions)?;
        let stream = backend.create_stream("terrain", stream_bytes(&mesh))?;
        backend.release_buffer(self.buffers.terrain)?;
        self.buffers.terrain = stream;
        self.mesh = mesh;
        self.vertices = Vec::new();
        self.dirty = true;
        tracing::info!(width, height, subdivisions, "terrain resized");
        Ok(())
    }

    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn noise(&self) -> &NoiseParameters {
        &self.noise
    }

    /// Mutable noise parameters. The terrain is re-shaded on the next frame.
    pub fn noise_mut(&mut self) -> &mut NoiseParameters {
        self.dirty = true;
        &mut self.noise
    }

    pub fn light(&self) -> &PointLight {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut PointLight {
        &mut self.light
    }

    pub fn water(&self) -> &Water {
        &self.water
    }

    pub fn water_mut(&mut self) -> &mut Water {
        &mut self.water
    }

    pub fn clear_color(&self) -> Rgb {
        self.clear_color
    }

    /// Biome counts from the most recent shading pass.
    pub fn histogram(&self) -> BiomeHistogram {
        self.histogram
    }

    /// Restore noise and light defaults. The seed is kept.
    pub fn reset_settings(&mut self) {
        self.noise.reset_settings();
        self.light.reset_settings();
        self.dirty = true;
    }
}

fn stream_bytes(mesh: &TerrainMesh) -> usize {
    mesh.grid().vertex_count() * std::mem::size_of::<ShadedVertex>()
}
