//! The rendering orchestrator. Owns the GPU context, the toolpath backend
//! and the overlay renderer.

pub mod cache;
pub mod context;
pub mod pipelines;

use self::{
    cache::KeyedSlot,
    context::{ContextId, GfxContext},
    pipelines::toolpath_lines::ToolpathRenderer,
};
use crate::data::{RequestId, ToolpathUniform};
use std::sync::Arc;
use toolpath::GeometryMetadata;
use winit::window::Window;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("failed to compile toolpath shader:\n{0}")]
    ShaderCompilation(String),

    #[error("failed to create toolpath pipeline:\n{0}")]
    PipelineCreation(String),

    #[error("GPU out of memory")]
    OutOfMemory,

    #[error("no suitable GPU adapter")]
    NoAdapter,
}

/// Tessellated overlay output for one frame.
pub struct UiFrame {
    pub shapes: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub toolpath: ToolpathRenderer,
    egui_renderer: KeyedSlot<ContextId, egui_wgpu::Renderer>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;

        Ok(Self {
            gfx,
            toolpath: ToolpathRenderer::new(),
            egui_renderer: KeyedSlot::new(),
        })
    }

    /// Replaces a lost context. Resources built for the old one turn stale.
    pub async fn recreate_context(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let previous = self.gfx.id;
        self.gfx = GfxContext::new(window).await?;
        log::info!("Render context {:?} replaced by {:?}", previous, self.gfx.id);
        Ok(())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 && new_size != self.gfx.size {
            self.gfx.resize(new_size);
        }
    }

    /// Drops every resource not built against the active context.
    pub fn evict_stale(&mut self) {
        self.toolpath.evict_stale(self.gfx.id);
        self.egui_renderer.evict_unless(self.gfx.id);
    }

    pub fn prepare_toolpath(
        &mut self,
        toolpath: RequestId,
        meta: &GeometryMetadata,
        uniform: &ToolpathUniform,
    ) -> Result<(), RenderError> {
        self.toolpath.prepare(&self.gfx, toolpath, meta, uniform)
    }

    /// Clears, draws the prepared toolpath (if any) and the overlay, presents.
    pub fn render(&mut self, toolpath: Option<RequestId>, ui: &UiFrame) -> Result<(), RenderError> {
        let frame = match self.gfx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gfx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(err) => {
                log::debug!("Skipping frame: {:?}", err);
                return Ok(());
            }
        };
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let gfx = &self.gfx;
        let egui_renderer = self.egui_renderer.get_or_insert_with(gfx.id, || {
            egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1)
        });

        let mut encoder = gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gfx.config.width, gfx.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        for (id, delta) in &ui.textures_delta.set {
            egui_renderer.update_texture(&gfx.device, &gfx.queue, *id, delta);
        }

        let ui_commands = egui_renderer.update_buffers(
            &gfx.device,
            &gfx.queue,
            &mut encoder,
            &ui.shapes,
            &screen_descriptor,
        );

        // Pass 1: toolpath line strip over a black background
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Toolpath Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(toolpath) = toolpath {
                self.toolpath.draw(&mut pass, gfx.id, toolpath);
            }
        }

        // Pass 2: overlay
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            egui_renderer.render(&mut pass, &ui.shapes, &screen_descriptor);
        }

        for id in &ui.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        gfx.queue
            .submit(ui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        Ok(())
    }

    /// Releases every GPU resource owned by the backends.
    pub fn release(&mut self) {
        self.toolpath.release();
        self.egui_renderer.clear();
        log::debug!("Released render resources for context {:?}", self.gfx.id);
    }
}
