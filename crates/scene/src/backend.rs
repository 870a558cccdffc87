use std::fmt;

use glam::{Mat4, Vec3};
use terrascape_common::Rgb;

/// Opaque handle to a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque handle to a vertex, index or stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

impl fmt::Display for ProgramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Which of the two scene programs a description refers to. The kind fixes
/// the vertex layout and the uniform interface; backends own the sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Consumes `ShadedVertex` (position, normal, colour).
    Terrain,
    /// Consumes `WaterVertex` (position, uv).
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec3,
    Mat4,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UniformKind::Float => "float",
            UniformKind::Vec3 => "vec3",
            UniformKind::Mat4 => "mat4",
        })
    }
}

impl ProgramKind {
    /// Named uniforms the program declares, with their types.
    pub fn uniforms(self) -> &'static [(&'static str, UniformKind)] {
        match self {
            ProgramKind::Terrain => &[
                ("model", UniformKind::Mat4),
                ("vp", UniformKind::Mat4),
                ("light_pos", UniformKind::Vec3),
                ("light_color", UniformKind::Vec3),
            ],
            ProgramKind::Water => &[
                ("model", UniformKind::Mat4),
                ("vp", UniformKind::Mat4),
                ("color", UniformKind::Vec3),
                ("light_color", UniformKind::Vec3),
                ("water_level", UniformKind::Float),
                ("opacity", UniformKind::Float),
            ],
        }
    }

    /// Type of `name`, or `None` if the program does not declare it.
    pub fn uniform_kind(self, name: &str) -> Option<UniformKind> {
        self.uniforms()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDesc {
    pub name: String,
    pub kind: ProgramKind,
    /// Request a geometry stage between vertex and fragment.
    pub geometry_stage: bool,
}

impl ProgramDesc {
    pub fn new(name: impl Into<String>, kind: ProgramKind) -> Self {
        Self {
            name: name.into(),
            kind,
            geometry_stage: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    /// Straight alpha: `src * a + dst * (1 - a)`.
    Alpha,
}

/// One draw, using the uniforms currently set on `program`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub program: ProgramHandle,
    pub vertices: BufferHandle,
    pub indices: Option<BufferHandle>,
    /// Vertex count, or index count when `indices` is set.
    pub count: u32,
    pub blend: BlendMode,
    pub depth_write: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{stage} stage of program '{program}' failed to compile: {log}")]
    Compile {
        program: String,
        stage: ShaderStage,
        log: String,
    },
    #[error("program '{program}' failed to link: {log}")]
    Link { program: String, log: String },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform { program: String, name: String },
    #[error("uniform '{name}' expects a {expected}")]
    UniformType { name: String, expected: UniformKind },
    #[error("unknown {0}")]
    UnknownProgram(ProgramHandle),
    #[error("unknown {0}")]
    UnknownBuffer(BufferHandle),
    #[error("no pipeline for {program} (blend {blend:?}, depth write {depth_write})")]
    MissingPipeline {
        program: ProgramHandle,
        blend: BlendMode,
        depth_write: bool,
    },
    #[error("{stream} holds {capacity} bytes, got {len}")]
    StreamOverflow {
        stream: BufferHandle,
        capacity: usize,
        len: usize,
    },
    #[error("{0} called outside begin_frame/end_frame")]
    NotInFrame(&'static str),
    #[error("no render target to draw into")]
    NoTarget,
    #[error("surface error: {0}")]
    Surface(String),
}

/// The narrow drawing interface scene composition needs.
///
/// Uniforms are program state: a value stays set until overwritten, and each
/// [`draw`](Self::draw) uses whatever is set at the time of the call.
pub trait GraphicsBackend {
    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, BackendError>;

    /// Static vertex data, uploaded once.
    fn upload_vertices(&mut self, label: &str, data: &[u8]) -> Result<BufferHandle, BackendError>;

    fn upload_indices(
        &mut self,
        label: &str,
        indices: &[u32],
    ) -> Result<BufferHandle, BackendError>;

    /// A vertex buffer rewritten between frames, sized in bytes.
    fn create_stream(
        &mut self,
        label: &str,
        capacity: usize,
    ) -> Result<BufferHandle, BackendError>;

    fn update_stream(&mut self, stream: BufferHandle, data: &[u8]) -> Result<(), BackendError>;

    /// Free a buffer of any kind. The handle must not be used afterwards.
    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), BackendError>;

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), BackendError>;

    fn begin_frame(&mut self, clear: Rgb) -> Result<(), BackendError>;

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError>;

    fn end_frame(&mut self) -> Result<(), BackendError>;
}

/// Shared uniform validation for backends.
pub fn check_uniform(
    program_name: &str,
    kind: ProgramKind,
    name: &str,
    value: &UniformValue,
) -> Result<(), BackendError> {
    match kind.uniform_kind(name) {
        None => Err(BackendError::UnknownUniform {
            program: program_name.to_string(),
            name: name.to_string(),
        }),
        Some(expected) if expected != value.kind() => Err(BackendError::UniformType {
            name: name.to_string(),
            expected,
        }),
        Some(_) => Ok(()),
    }
}
