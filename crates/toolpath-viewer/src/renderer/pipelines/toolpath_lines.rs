use crate::{
    data::{RequestId, ToolpathUniform, ToolpathVertex},
    renderer::{
        cache::{KeyedSlot, SlotState},
        context::{ContextId, GfxContext},
        RenderError,
    },
};
use rayon::prelude::*;
use std::ops::Range;
use toolpath::GeometryMetadata;
use wgpu::util::DeviceExt;

/// Lifecycle of the toolpath backend relative to the active context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Ready,
    /// Resources belong to a context that is no longer active.
    Stale,
}

impl From<SlotState> for BackendState {
    fn from(state: SlotState) -> Self {
        match state {
            SlotState::Empty => Self::Uninitialized,
            SlotState::Current => Self::Ready,
            SlotState::Stale => Self::Stale,
        }
    }
}

/// Vertex range for a line strip over `count` vertices; `None` means no draw.
pub fn draw_range(count: u32) -> Option<Range<u32>> {
    (count > 0).then_some(0..count)
}

/// Shader program, uniform block and blend state for the toolpath.
pub struct ToolpathPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ToolpathPipeline {
    pub fn new(device: &wgpu::Device, color_fmt: wgpu::TextureFormat) -> Result<Self, RenderError> {
        // Shader module; validation errors carry the WGSL compiler's diagnostics.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/toolpath.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/toolpath.wgsl").into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation(err.to_string()));
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Toolpath Uniform Buffer"),
            size: std::mem::size_of::<ToolpathUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Toolpath UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ToolpathUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Toolpath Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let vbuf_layouts = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ToolpathVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position (vec3)
                wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Cumulative travel (f32)
                wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 12,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Toolpath PipelineLayout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Toolpath Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                ..Default::default()
            },
            depth_stencil: None,
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::PipelineCreation(err.to_string()));
        }

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
        })
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniform: &ToolpathUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, mesh: &'a ToolpathMesh) {
        let (Some(vertices), Some(range)) = (&mesh.vertex_buffer, draw_range(mesh.vertex_count))
        else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, vertices.slice(..));
        rpass.draw(range, 0..1);
    }
}

/// Vertex buffer holding one toolpath's annotated points.
pub struct ToolpathMesh {
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl ToolpathMesh {
    pub fn upload(device: &wgpu::Device, meta: &GeometryMetadata) -> Self {
        let vertices: Vec<ToolpathVertex> = meta
            .annotated_points
            .par_iter()
            .map(ToolpathVertex::from)
            .collect();

        // Empty toolpaths get no buffer; drawing them is a no-op.
        let vertex_buffer = (!vertices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Toolpath Vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// The context a vertex buffer lives in and the toolpath it holds.
type MeshKey = (ContextId, RequestId);

/// Drops a mesh built in a context other than `context`. A mesh for another
/// toolpath in the same context stays until the next upload replaces it.
fn evict_foreign_mesh<V>(slot: &mut KeyedSlot<MeshKey, V>, context: ContextId) -> bool {
    slot.evict_if(|(ctx, _)| *ctx != context)
}

/// Owns the toolpath's GPU resources, keyed by the context they were built
/// against (and, for the vertex buffer, the toolpath they hold).
#[derive(Default)]
pub struct ToolpathRenderer {
    pipeline: KeyedSlot<ContextId, ToolpathPipeline>,
    mesh: KeyedSlot<MeshKey, ToolpathMesh>,
}

impl ToolpathRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, context: ContextId) -> BackendState {
        self.pipeline.state(context).into()
    }

    /// Builds anything missing for `gfx`, uploads the toolpath if it changed
    /// and writes this frame's uniforms.
    pub fn prepare(
        &mut self,
        gfx: &GfxContext,
        toolpath: RequestId,
        meta: &GeometryMetadata,
        uniform: &ToolpathUniform,
    ) -> Result<(), RenderError> {
        if self.state(gfx.id) == BackendState::Stale {
            self.release();
        }

        let pipeline = self.pipeline.get_or_try_insert_with(gfx.id, || {
            log::debug!("Building toolpath pipeline for context {:?}", gfx.id);
            ToolpathPipeline::new(&gfx.device, gfx.config.format)
        })?;
        pipeline.write_uniforms(&gfx.queue, uniform);

        self.mesh.get_or_insert_with((gfx.id, toolpath), || {
            log::debug!(
                "Uploading {} toolpath vertices for {:?}",
                meta.len(),
                toolpath
            );
            ToolpathMesh::upload(&gfx.device, meta)
        });
        Ok(())
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        context: ContextId,
        toolpath: RequestId,
    ) {
        if let (Some(pipeline), Some(mesh)) = (
            self.pipeline.get(context),
            self.mesh.get((context, toolpath)),
        ) {
            pipeline.draw(rpass, mesh);
        }
    }

    /// Drops resources that belong to a context other than `context`.
    pub fn evict_stale(&mut self, context: ContextId) {
        if self.pipeline.evict_unless(context) {
            log::debug!("Released toolpath pipeline from a previous context");
        }
        if evict_foreign_mesh(&mut self.mesh, context) {
            log::debug!("Released toolpath vertices from a previous context");
        }
    }

    /// Releases every GPU resource.
    pub fn release(&mut self) {
        self.mesh.clear();
        self.pipeline.clear();
    }
}
