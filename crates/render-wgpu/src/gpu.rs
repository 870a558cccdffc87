use std::collections::HashMap;

use terrascape_common::Rgb;
use terrascape_scene::{
    BackendError, BlendMode, BufferHandle, DrawCall, GraphicsBackend, ProgramDesc, ProgramHandle,
    ProgramKind, ShaderStage, UniformValue, WaterVertex, check_uniform,
};
use terrascape_terrain::ShadedVertex;
use wgpu::util::DeviceExt;

use crate::shaders;
use crate::uniforms::UniformBlock;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct GpuProgram {
    name: String,
    kind: ProgramKind,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    uniforms: UniformBlock,
}

enum GpuBuffer {
    Vertex(wgpu::Buffer),
    Index(wgpu::Buffer),
    Stream { buffer: wgpu::Buffer, capacity: usize },
}

impl GpuBuffer {
    fn buffer(&self) -> &wgpu::Buffer {
        match self {
            GpuBuffer::Vertex(b) | GpuBuffer::Index(b) => b,
            GpuBuffer::Stream { buffer, .. } => buffer,
        }
    }
}

type PipelineKey = (ProgramHandle, BlendMode, bool);

struct PendingDraw {
    call: DrawCall,
    uniforms: UniformBlock,
}

/// [`GraphicsBackend`] on top of a wgpu device.
///
/// Draws are collected between `begin_frame` and `end_frame`, then encoded
/// into a single render pass against the current target view.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    depth_texture: wgpu::TextureView,
    programs: Vec<GpuProgram>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    buffers: Vec<Option<GpuBuffer>>,
    target: Option<wgpu::TextureView>,
    clear: Option<Rgb>,
    pending: Vec<PendingDraw>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let depth_texture = create_depth_texture(&device, width, height);
        Self {
            device,
            queue,
            surface_format,
            depth_texture,
            programs: Vec::new(),
            pipelines: HashMap::new(),
            buffers: Vec::new(),
            target: None,
            clear: None,
            pending: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(&self.device, width, height);
    }

    /// View the next frame renders into. Consumed by `end_frame`.
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    fn program(&self, handle: ProgramHandle) -> Result<&GpuProgram, BackendError> {
        self.programs
            .get(handle.0 as usize)
            .ok_or(BackendError::UnknownProgram(handle))
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&GpuBuffer, BackendError> {
        self.buffers
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(BackendError::UnknownBuffer(handle))
    }

    fn push_buffer(&mut self, buffer: GpuBuffer) -> BufferHandle {
        self.buffers.push(Some(buffer));
        BufferHandle(self.buffers.len() as u32 - 1)
    }

    /// Compile one stage inside a validation scope so errors come back as
    /// values rather than through the device's uncaptured-error handler.
    fn compile_stage(
        &self,
        desc: &ProgramDesc,
        stage: ShaderStage,
    ) -> Result<wgpu::ShaderModule, BackendError> {
        let source = shaders::source(desc.kind, stage).ok_or_else(|| {
            BackendError::Unsupported(format!("{stage} stage in WGSL"))
        })?;
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_{stage}", desc.name)),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(BackendError::Compile {
                program: desc.name.clone(),
                stage,
                log: err.to_string(),
            }),
            None => Ok(module),
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> Result<(), BackendError> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let (handle, blend, depth_write) = key;
        let program = self.program(handle)?;
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = build_pipeline(
            &self.device,
            program,
            self.surface_format,
            blend,
            depth_write,
        );
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::Link {
                program: program.name.clone(),
                log: err.to_string(),
            });
        }
        tracing::debug!(program = %program.name, ?blend, depth_write, "pipeline created");
        self.pipelines.insert(key, pipeline);
        Ok(())
    }
}

impl GraphicsBackend for WgpuBackend {
    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, BackendError> {
        if desc.geometry_stage {
            return Err(BackendError::Unsupported(format!(
                "program '{}' requests a geometry stage; wgpu has none",
                desc.name
            )));
        }

        let vertex = self.compile_stage(desc, ShaderStage::Vertex)?;
        let fragment = self.compile_stage(desc, ShaderStage::Fragment)?;

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{}_uniform_layout", desc.name)),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_pipeline_layout", desc.name)),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        self.programs.push(GpuProgram {
            name: desc.name.clone(),
            kind: desc.kind,
            vertex,
            fragment,
            bind_group_layout,
            layout,
            uniforms: UniformBlock::new(desc.kind),
        });
        let handle = ProgramHandle(self.programs.len() as u32 - 1);

        // Link the pipeline this kind is normally drawn with, so interface
        // mismatches fail here instead of mid-frame.
        let default_key = match desc.kind {
            ProgramKind::Terrain => (handle, BlendMode::Opaque, true),
            ProgramKind::Water => (handle, BlendMode::Alpha, false),
        };
        if let Err(err) = self.ensure_pipeline(default_key) {
            self.programs.pop();
            return Err(err);
        }

        tracing::info!(program = %desc.name, %handle, "program compiled");
        Ok(handle)
    }

    fn upload_vertices(&mut self, label: &str, data: &[u8]) -> Result<BufferHandle, BackendError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(self.push_buffer(GpuBuffer::Vertex(buffer)))
    }

    fn upload_indices(
        &mut self,
        label: &str,
        indices: &[u32],
    ) -> Result<BufferHandle, BackendError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(self.push_buffer(GpuBuffer::Index(buffer)))
    }

    fn create_stream(
        &mut self,
        label: &str,
        capacity: usize,
    ) -> Result<BufferHandle, BackendError> {
        let size = (capacity as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        tracing::debug!(label, capacity, "stream allocated");
        Ok(self.push_buffer(GpuBuffer::Stream { buffer, capacity }))
    }

    fn update_stream(&mut self, stream: BufferHandle, data: &[u8]) -> Result<(), BackendError> {
        match self.buffer(stream)? {
            GpuBuffer::Stream { buffer, capacity } => {
                if data.len() > *capacity {
                    return Err(BackendError::StreamOverflow {
                        stream,
                        capacity: *capacity,
                        len: data.len(),
                    });
                }
                self.queue.write_buffer(buffer, 0, data);
                Ok(())
            }
            _ => Err(BackendError::UnknownBuffer(stream)),
        }
    }

    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), BackendError> {
        self.buffer(buffer)?;
        if let Some(released) = self.buffers[buffer.0 as usize].take() {
            released.buffer().destroy();
        }
        Ok(())
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), BackendError> {
        let entry = self
            .programs
            .get_mut(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))?;
        check_uniform(&entry.name, entry.kind, name, &value)?;
        entry.uniforms.set(name, value);
        Ok(())
    }

    fn begin_frame(&mut self, clear: Rgb) -> Result<(), BackendError> {
        if self.target.is_none() {
            return Err(BackendError::NoTarget);
        }
        self.clear = Some(clear);
        self.pending.clear();
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        if self.clear.is_none() {
            return Err(BackendError::NotInFrame("draw"));
        }
        if matches!(self.buffer(call.vertices)?, GpuBuffer::Index(_)) {
            return Err(BackendError::UnknownBuffer(call.vertices));
        }
        if let Some(indices) = call.indices {
            if !matches!(self.buffer(indices)?, GpuBuffer::Index(_)) {
                return Err(BackendError::UnknownBuffer(indices));
            }
        }
        self.ensure_pipeline((call.program, call.blend, call.depth_write))?;
        let uniforms = self.program(call.program)?.uniforms;
        self.pending.push(PendingDraw {
            call: *call,
            uniforms,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let clear = self.clear.take().ok_or(BackendError::NotInFrame("end_frame"))?;
        let target = self.target.take().ok_or(BackendError::NoTarget)?;
        let draws = std::mem::take(&mut self.pending);

        // One small uniform buffer per draw keeps each draw's snapshot intact.
        let mut bind_groups = Vec::with_capacity(draws.len());
        for draw in &draws {
            let program = self.program(draw.call.program)?;
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{}_uniforms", program.name)),
                    contents: draw.uniforms.as_bytes(),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            bind_groups.push(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{}_bind_group", program.name)),
                layout: &program.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            }));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for (draw, bind_group) in draws.iter().zip(&bind_groups) {
                let call = &draw.call;
                pass.set_pipeline(pipeline_for(&self.pipelines, call)?);
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_vertex_buffer(0, self.buffer(call.vertices)?.buffer().slice(..));
                match call.indices {
                    Some(indices) => {
                        pass.set_index_buffer(
                            self.buffer(indices)?.buffer().slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        pass.draw_indexed(0..call.count, 0, 0..1);
                    }
                    None => pass.draw(0..call.count, 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!(draws = draws.len(), "frame submitted");
        Ok(())
    }
}

fn pipeline_for<'a, P>(
    pipelines: &'a HashMap<PipelineKey, P>,
    call: &DrawCall,
) -> Result<&'a P, BackendError> {
    pipelines
        .get(&(call.program, call.blend, call.depth_write))
        .ok_or(BackendError::MissingPipeline {
            program: call.program,
            blend: call.blend,
            depth_write: call.depth_write,
        })
}

fn vertex_layout(kind: ProgramKind) -> wgpu::VertexBufferLayout<'static> {
    match kind {
        ProgramKind::Terrain => wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShadedVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TERRAIN_ATTRIBUTES,
        },
        ProgramKind::Water => wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<WaterVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &WATER_ATTRIBUTES,
        },
    }
}

const TERRAIN_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x3,
];

const WATER_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
];

fn build_pipeline(
    device: &wgpu::Device,
    program: &GpuProgram,
    surface_format: wgpu::TextureFormat,
    blend: BlendMode,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    let blend = match blend {
        BlendMode::Opaque => wgpu::BlendState::REPLACE,
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{}_pipeline", program.name)),
        layout: Some(&program.layout),
        vertex: wgpu::VertexState {
            module: &program.vertex,
            entry_point: Some(shaders::VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[vertex_layout(program.kind)],
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.fragment,
            entry_point: Some(shaders::FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            // The camera can fly under the surface; draw both faces.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
