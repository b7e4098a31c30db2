use crate::{
    camera::{CameraController, CameraState},
    config::Config,
    data::{FileSource, ToolpathLoader, ToolpathUniform},
    frame::FrameCallbacks,
    renderer::{context::ContextId, RenderError, Renderer, UiFrame},
    transform::compose_transform,
    ui,
};
use anyhow::Result;
use std::{path::Path, sync::Arc};
use toolpath::RevealParameters;
use winit::{event::WindowEvent, window::Window};

pub struct App {
    window: Arc<Window>,
    pub renderer: Renderer,
    pub camera: CameraState,
    pub camera_controller: CameraController,
    pub reveal: RevealParameters,
    pub loader: ToolpathLoader<FileSource>,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    /// Context the overlay's textures were last uploaded to.
    ui_context: Option<ContextId>,
    info_open: bool,
    /// Set once the toolpath backend failed for the active context.
    render_failure: Option<RenderError>,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let (egui_ctx, egui_state) = new_overlay(&window);

        let mut app = Self {
            window,
            renderer,
            camera: CameraState::default(),
            camera_controller: CameraController::new(),
            reveal: RevealParameters::default(),
            loader: ToolpathLoader::new(FileSource::new(&config.root)),
            egui_ctx,
            egui_state,
            ui_context: None,
            info_open: true,
            render_failure: None,
        };

        match &config.file {
            Some(file) => app.open(file),
            None => log::info!("No toolpath given; drop a file onto the window to open one"),
        }

        Ok(app)
    }

    /// Starts loading `path` as a new view: camera and reveal go back to
    /// their defaults.
    pub fn open(&mut self, path: &str) {
        log::info!("Opening toolpath '{}'", path);
        self.loader.request(path);
        self.reveal.clear();
        self.camera.reset();
    }

    /// Returns `true` if the overlay consumed the event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        if response.consumed {
            self.camera_controller.track_event(event);
            return true;
        }

        self.camera_controller.handle_event(event, &mut self.camera);

        match event {
            WindowEvent::Resized(physical_size) => self.renderer.resize(*physical_size),
            WindowEvent::DroppedFile(path) => self.open_dropped(path),
            _ => {}
        }

        false
    }

    fn open_dropped(&mut self, path: &Path) {
        match path.to_str() {
            Some(path) => self.open(path),
            None => log::warn!("Ignoring dropped file with a non UTF-8 path: {}", path.display()),
        }
    }

    /// Aborts the in-flight request and releases every GPU resource.
    pub fn teardown(&mut self) {
        self.loader.abort();
        self.renderer.release();
    }

    fn reset_overlay(&mut self) {
        let (egui_ctx, egui_state) = new_overlay(&self.window);
        self.egui_ctx = egui_ctx;
        self.egui_state = egui_state;
    }

    fn build_overlay(&mut self) -> UiFrame {
        let egui_input = self.egui_state.take_egui_input(&self.window);
        self.egui_ctx.begin_frame(egui_input);

        ui::draw_load_state(&self.egui_ctx, self.loader.state());

        if let Some(loaded) = self.loader.loaded() {
            let meta = &loaded.metadata;
            if ui::draw_reveal_sliders(&self.egui_ctx, &mut self.reveal, meta) {
                log::trace!("Reveal changed: {:?}", self.reveal);
            }
            ui::draw_job_info(&self.egui_ctx, meta, &mut self.info_open);
        }

        if ui::draw_toolbar(&self.egui_ctx, &mut self.info_open) {
            self.camera.reset();
        }

        if let Some(err) = &self.render_failure {
            ui::draw_render_failure(&self.egui_ctx, err);
        }

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(&self.window, egui_output.platform_output);

        UiFrame {
            shapes: self
                .egui_ctx
                .tessellate(egui_output.shapes, egui_output.pixels_per_point),
            textures_delta: egui_output.textures_delta,
            pixels_per_point: egui_output.pixels_per_point,
        }
    }
}

impl FrameCallbacks for App {
    type Target = ContextId;

    fn resolve_target(&mut self) -> Option<ContextId> {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return None;
        }

        if self.renderer.gfx.is_lost() {
            let recreated = pollster::block_on(self.renderer.recreate_context(self.window.clone()));
            if let Err(err) = recreated {
                log::warn!("Render context unavailable: {:#}", err);
                return None;
            }
        }

        Some(self.renderer.gfx.id)
    }

    fn setup(&mut self, target: ContextId) -> Result<()> {
        self.renderer.evict_stale();

        // A new overlay renderer starts without the font atlas, which egui
        // only sends once per context.
        if self.ui_context.is_some_and(|previous| previous != target) {
            self.reset_overlay();
        }
        self.ui_context = Some(target);
        self.render_failure = None;

        Ok(())
    }

    fn render(&mut self, _target: ContextId) -> Result<()> {
        self.renderer.resize(self.window.inner_size());
        self.loader.poll();

        let ui_frame = self.build_overlay();

        let loaded = match self.render_failure {
            None => self.loader.loaded().cloned(),
            Some(_) => None,
        };

        let mut toolpath = None;
        if let Some(loaded) = loaded {
            let meta = &loaded.metadata;
            let transform = compose_transform(meta, &self.camera, self.renderer.gfx.aspect_ratio());
            let uniform = ToolpathUniform::new(
                transform.as_mat4(),
                self.reveal.effective_height(meta) as f32,
                self.reveal.effective_distance(meta) as f32,
            );

            match self.renderer.prepare_toolpath(loaded.request, meta, &uniform) {
                Ok(()) => toolpath = Some(loaded.request),
                Err(err) => {
                    log::error!("Toolpath renderer unavailable: {}", err);
                    self.render_failure = Some(err);
                }
            }
        }

        self.renderer.render(toolpath, &ui_frame)?;
        Ok(())
    }
}

fn new_overlay(window: &Window) -> (egui::Context, egui_winit::State) {
    let egui_ctx = egui::Context::default();
    let egui_state = egui_winit::State::new(
        egui_ctx.clone(),
        egui_ctx.viewport_id(),
        window,
        None,
        None,
    );
    (egui_ctx, egui_state)
}
