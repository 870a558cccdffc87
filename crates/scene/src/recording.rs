use std::collections::HashMap;
use std::fmt;

use terrascape_common::Rgb;

use crate::backend::{
    BackendError, BufferHandle, DrawCall, GraphicsBackend, ProgramDesc, ProgramHandle,
    ProgramKind, ShaderStage, UniformValue, check_uniform,
};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CompileProgram {
        name: String,
        handle: ProgramHandle,
    },
    UploadVertices {
        label: String,
        handle: BufferHandle,
        bytes: usize,
    },
    UploadIndices {
        label: String,
        handle: BufferHandle,
        count: usize,
    },
    CreateStream {
        label: String,
        handle: BufferHandle,
        capacity: usize,
    },
    UpdateStream {
        handle: BufferHandle,
        bytes: usize,
    },
    ReleaseBuffer {
        handle: BufferHandle,
    },
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: UniformValue,
    },
    BeginFrame {
        clear: Rgb,
    },
    Draw(DrawCall),
    EndFrame,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CompileProgram { name, handle } => write!(f, "compile {name} -> {handle}"),
            Command::UploadVertices {
                label,
                handle,
                bytes,
            } => write!(f, "upload vertices {label} ({bytes} bytes) -> {handle}"),
            Command::UploadIndices {
                label,
                handle,
                count,
            } => write!(f, "upload indices {label} ({count}) -> {handle}"),
            Command::CreateStream {
                label,
                handle,
                capacity,
            } => write!(f, "create stream {label} ({capacity} bytes) -> {handle}"),
            Command::UpdateStream { handle, bytes } => {
                write!(f, "update {handle} ({bytes} bytes)")
            }
            Command::ReleaseBuffer { handle } => write!(f, "release {handle}"),
            Command::SetUniform {
                program,
                name,
                value,
            } => write!(f, "uniform {program}.{name} = {}", value.kind()),
            Command::BeginFrame { clear } => {
                write!(f, "begin frame clear=({}, {}, {})", clear.r, clear.g, clear.b)
            }
            Command::Draw(call) => write!(
                f,
                "draw {} {} count={} blend={:?} depth_write={}",
                call.program,
                call.vertices,
                call.count,
                call.blend,
                call.depth_write
            ),
            Command::EndFrame => f.write_str("end frame"),
        }
    }
}

#[derive(Debug)]
struct RecordedProgram {
    name: String,
    kind: ProgramKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferKind {
    Vertex,
    Index,
    Stream { capacity: usize },
}

/// Headless backend that validates and records every call.
///
/// Used by tests and by the CLI's dry-run frame. Compile failures can be
/// injected per program name to exercise startup error paths.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    programs: Vec<RecordedProgram>,
    buffers: Vec<Option<BufferKind>>,
    failures: HashMap<String, (ShaderStage, String)>,
    in_frame: bool,
    frames: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next compile of `program` fail in `stage` with `log`.
    pub fn fail_compile(&mut self, program: &str, stage: ShaderStage, log: &str) {
        self.failures
            .insert(program.to_string(), (stage, log.to_string()));
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn program(&self, handle: ProgramHandle) -> Result<&RecordedProgram, BackendError> {
        self.programs
            .get(handle.0 as usize)
            .ok_or(BackendError::UnknownProgram(handle))
    }

    fn buffer(&self, handle: BufferHandle) -> Result<BufferKind, BackendError> {
        self.buffers
            .get(handle.0 as usize)
            .copied()
            .flatten()
            .ok_or(BackendError::UnknownBuffer(handle))
    }

    fn push_buffer(&mut self, kind: BufferKind) -> BufferHandle {
        self.buffers.push(Some(kind));
        BufferHandle(self.buffers.len() as u32 - 1)
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, BackendError> {
        if let Some((stage, log)) = self.failures.remove(&desc.name) {
            return Err(BackendError::Compile {
                program: desc.name.clone(),
                stage,
                log,
            });
        }
        self.programs.push(RecordedProgram {
            name: desc.name.clone(),
            kind: desc.kind,
        });
        let handle = ProgramHandle(self.programs.len() as u32 - 1);
        self.commands.push(Command::CompileProgram {
            name: desc.name.clone(),
            handle,
        });
        Ok(handle)
    }

    fn upload_vertices(&mut self, label: &str, data: &[u8]) -> Result<BufferHandle, BackendError> {
        let handle = self.push_buffer(BufferKind::Vertex);
        self.commands.push(Command::UploadVertices {
            label: label.to_string(),
            handle,
            bytes: data.len(),
        });
        Ok(handle)
    }

    fn upload_indices(
        &mut self,
        label: &str,
        indices: &[u32],
    ) -> Result<BufferHandle, BackendError> {
        let handle = self.push_buffer(BufferKind::Index);
        self.commands.push(Command::UploadIndices {
            label: label.to_string(),
            handle,
            count: indices.len(),
        });
        Ok(handle)
    }

    fn create_stream(
        &mut self,
        label: &str,
        capacity: usize,
    ) -> Result<BufferHandle, BackendError> {
        let handle = self.push_buffer(BufferKind::Stream { capacity });
        self.commands.push(Command::CreateStream {
            label: label.to_string(),
            handle,
            capacity,
        });
        Ok(handle)
    }

    fn update_stream(&mut self, stream: BufferHandle, data: &[u8]) -> Result<(), BackendError> {
        match self.buffer(stream)? {
            BufferKind::Stream { capacity } if data.len() > capacity => {
                return Err(BackendError::StreamOverflow {
                    stream,
                    capacity,
                    len: data.len(),
                });
            }
            BufferKind::Stream { .. } => {}
            _ => return Err(BackendError::UnknownBuffer(stream)),
        }
        self.commands.push(Command::UpdateStream {
            handle: stream,
            bytes: data.len(),
        });
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), BackendError> {
        self.buffer(buffer)?;
        self.buffers[buffer.0 as usize] = None;
        self.commands.push(Command::ReleaseBuffer { handle: buffer });
        Ok(())
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), BackendError> {
        let recorded = self.program(program)?;
        check_uniform(&recorded.name, recorded.kind, name, &value)?;
        self.commands.push(Command::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn begin_frame(&mut self, clear: Rgb) -> Result<(), BackendError> {
        self.in_frame = true;
        self.commands.push(Command::BeginFrame { clear });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::NotInFrame("draw"));
        }
        self.program(call.program)?;
        if self.buffer(call.vertices)? == BufferKind::Index {
            return Err(BackendError::UnknownBuffer(call.vertices));
        }
        if let Some(indices) = call.indices {
            if self.buffer(indices)? != BufferKind::Index {
                return Err(BackendError::UnknownBuffer(indices));
            }
        }
        self.commands.push(Command::Draw(*call));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::NotInFrame("end_frame"));
        }
        self.in_frame = false;
        self.frames += 1;
        self.commands.push(Command::EndFrame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BlendMode, UniformKind};
    use glam::Mat4;

    #[test]
    fn records_calls_in_order() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .compile_program(&ProgramDesc::new("water", ProgramKind::Water))
            .unwrap();
        let vbo = backend.upload_vertices("quad", &[0u8; 80]).unwrap();
        let ibo = backend.upload_indices("quad", &[0, 1, 2]).unwrap();
        backend.begin_frame(Rgb::BLACK).unwrap();
        backend
            .set_uniform(program, "opacity", UniformValue::Float(0.5))
            .unwrap();
        backend
            .draw(&DrawCall {
                program,
                vertices: vbo,
                indices: Some(ibo),
                count: 3,
                blend: BlendMode::Alpha,
                depth_write: false,
            })
            .unwrap();
        backend.end_frame().unwrap();

        let log = backend.commands();
        assert_eq!(log.len(), 7);
        assert!(matches!(log[0], Command::CompileProgram { .. }));
        assert!(matches!(log[5], Command::Draw(_)));
        assert_eq!(log[6], Command::EndFrame);
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn injected_compile_failure() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile("terrain", ShaderStage::Vertex, "syntax error");
        let err = backend
            .compile_program(&ProgramDesc::new("terrain", ProgramKind::Terrain))
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Compile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert!(backend.commands().is_empty());
        // The injection is consumed.
        assert!(
            backend
                .compile_program(&ProgramDesc::new("terrain", ProgramKind::Terrain))
                .is_ok()
        );
    }

    #[test]
    fn uniforms_are_checked_against_program_kind() {
        let mut backend = RecordingBackend::new();
        let terrain = backend
            .compile_program(&ProgramDesc::new("terrain", ProgramKind::Terrain))
            .unwrap();
        assert!(matches!(
            backend.set_uniform(terrain, "opacity", UniformValue::Float(1.0)),
            Err(BackendError::UnknownUniform { .. })
        ));
        assert!(matches!(
            backend.set_uniform(terrain, "vp", UniformValue::Float(1.0)),
            Err(BackendError::UniformType {
                expected: UniformKind::Mat4,
                ..
            })
        ));
        assert!(matches!(
            backend.set_uniform(ProgramHandle(9), "vp", UniformValue::Mat4(Mat4::IDENTITY)),
            Err(BackendError::UnknownProgram(ProgramHandle(9)))
        ));
    }

    #[test]
    fn stream_capacity_is_enforced() {
        let mut backend = RecordingBackend::new();
        let stream = backend.create_stream("terrain", 16).unwrap();
        assert!(backend.update_stream(stream, &[0u8; 16]).is_ok());
        assert!(matches!(
            backend.update_stream(stream, &[0u8; 17]),
            Err(BackendError::StreamOverflow { capacity: 16, len: 17, .. })
        ));
        let vbo = backend.upload_vertices("static", &[0u8; 4]).unwrap();
        assert!(backend.update_stream(vbo, &[0u8; 4]).is_err());
    }

    #[test]
    fn released_buffers_are_unknown() {
        let mut backend = RecordingBackend::new();
        let stream = backend.create_stream("terrain", 16).unwrap();
        backend.release_buffer(stream).unwrap();
        assert!(matches!(
            backend.update_stream(stream, &[0u8; 4]),
            Err(BackendError::UnknownBuffer(_))
        ));
        assert!(backend.release_buffer(stream).is_err());
    }

    #[test]
    fn draw_requires_open_frame() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .compile_program(&ProgramDesc::new("terrain", ProgramKind::Terrain))
            .unwrap();
        let stream = backend.create_stream("terrain", 64).unwrap();
        let call = DrawCall {
            program,
            vertices: stream,
            indices: None,
            count: 3,
            blend: BlendMode::Opaque,
            depth_write: true,
        };
        assert!(matches!(
            backend.draw(&call),
            Err(BackendError::NotInFrame("draw"))
        ));
        assert!(backend.end_frame().is_err());
    }

    #[test]
    fn display_is_one_line_per_command() {
        let cmd = Command::UpdateStream {
            handle: BufferHandle(2),
            bytes: 36,
        };
        assert_eq!(cmd.to_string(), "update buffer#2 (36 bytes)");
    }
}
