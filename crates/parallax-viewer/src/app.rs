use crate::{
    input::InputController,
    loader::LoadEvent,
    renderer::Renderer,
    ui::{self, UploadFailure},
};
use anyhow::Result;
use crossbeam_channel::Receiver;
use depthview::engine::{LoopToken, COLOR_PLACEHOLDER};
use depthview::{AssetKind, ColorImage, DepthMap, EngineState, RenderEngine, Viewport};
use std::sync::Arc;
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// Binding revisions already on the GPU.
#[derive(Debug, Default)]
struct Uploaded {
    grid: bool,
    color: Option<u64>,
    depth: Option<u64>,
}

/// What the event loop should do after the current batch of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Redraw,
    Exit,
}

/// Keeps redrawing while assets load so decode events get pumped; once the
/// render loop has started, runs only as long as its token does.
pub fn schedule(state: EngineState, loop_running: bool) -> Schedule {
    match state {
        EngineState::Uninitialized | EngineState::AssetsLoading => Schedule::Redraw,
        EngineState::Ready | EngineState::Rendering if loop_running => Schedule::Redraw,
        EngineState::Ready | EngineState::Rendering | EngineState::Disposed => Schedule::Exit,
    }
}

pub struct App {
    pub renderer: Renderer,
    pub engine: RenderEngine,
    render_loop: LoopToken,
    input: InputController,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    events: Receiver<LoadEvent>,
    uploaded: Uploaded,
    upload_failures: Vec<UploadFailure>,
}

fn viewport_of(size: winit::dpi::PhysicalSize<u32>) -> Viewport {
    Viewport::new(size.width, size.height)
}

fn color_placeholder() -> ColorImage {
    ColorImage::from(image::RgbImage::from_pixel(1, 1, image::Rgb(COLOR_PLACEHOLDER)))
}

fn depth_placeholder() -> DepthMap {
    DepthMap::from(image::GrayImage::from_pixel(1, 1, image::Luma([0])))
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        events: Receiver<LoadEvent>,
        point_size_px: f32,
    ) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;

        let mut engine = RenderEngine::new().with_point_size(point_size_px);
        engine.document_loaded(viewport_of(renderer.gfx.size))?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            Some(renderer.gfx.max_texture_side() as usize),
        );

        Ok(Self {
            renderer,
            render_loop: engine.loop_token(),
            engine,
            input: InputController::new(),
            egui_ctx,
            egui_state,
            events,
            uploaded: Uploaded::default(),
            upload_failures: Vec::new(),
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.engine.state() == EngineState::Disposed
    }

    pub fn schedule(&self) -> Schedule {
        schedule(self.engine.state(), self.render_loop.is_running())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.engine.resize(viewport_of(new_size));
        }
    }

    /// Returns true when the event was consumed by the UI or the camera.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        if let WindowEvent::Resized(size) = event {
            self.resize(*size);
            return false;
        }

        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && !event.repeat
                && event.physical_key == PhysicalKey::Code(KeyCode::KeyR)
            {
                self.engine.reset_camera();
                return true;
            }
        }

        let viewport_h = self.renderer.gfx.size.height as f32;
        match self.engine.controls_mut() {
            Some(controls) => self.input.handle_event(event, controls, viewport_h),
            None => false,
        }
    }

    /// Feeds finished decodes to the engine, in arrival order.
    fn pump_events(&mut self) {
        let events: Vec<LoadEvent> = self.events.try_iter().collect();
        for ev in events {
            let res = match ev {
                LoadEvent::Color(r) => self.engine.color_decoded(r),
                LoadEvent::Depth(r) => self.engine.depth_decoded(r),
            };
            if let Err(err) = res {
                log::warn!("Ignoring asset event: {err}");
            }
        }
    }

    /// Uploads whatever engine bindings changed since the last frame.
    fn sync_gpu(&mut self) {
        let Some(scene) = self.engine.scene() else {
            return;
        };
        let gfx = &self.renderer.gfx;
        let points = &mut self.renderer.points;

        if !self.uploaded.grid {
            points.set_grid(&gfx.device, &scene.grid);
            self.uploaded.grid = true;
            log::info!("Point grid {} ready ({} points)", scene.dimensions(), scene.grid.len());
        }

        let color = self.engine.color();
        if self.uploaded.color != Some(color.revision()) {
            if let Err(err) = points.set_color(&gfx.device, &gfx.queue, color.texels()) {
                log::error!("Color upload failed: {err:#}");
                self.upload_failures.push(UploadFailure {
                    kind: AssetKind::Color,
                    message: format!("{err:#}"),
                });
                if let Err(err) = points.set_color(&gfx.device, &gfx.queue, &color_placeholder()) {
                    log::error!("Color placeholder upload failed: {err:#}");
                }
            }
            self.uploaded.color = Some(color.revision());
        }

        let depth = self.engine.depth();
        if self.uploaded.depth != Some(depth.revision()) {
            if let Err(err) = points.set_depth(&gfx.device, &gfx.queue, depth.texels()) {
                log::error!("Depth upload failed: {err:#}");
                self.upload_failures.push(UploadFailure {
                    kind: AssetKind::Depth,
                    message: format!("{err:#}"),
                });
                if let Err(err) = points.set_depth(&gfx.device, &gfx.queue, &depth_placeholder()) {
                    log::error!("Depth placeholder upload failed: {err:#}");
                }
            }
            self.uploaded.depth = Some(depth.revision());
        }
    }

    /// Stops the render loop and releases scene resources. Safe to repeat.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.engine.dispose();
        self.renderer.points.clear();
        self.uploaded = Uploaded::default();
        log::info!("Viewer disposed");
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.pump_events();
        self.sync_gpu();

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let inputs = self
            .engine
            .frame()
            .filter(|_| self.renderer.points.is_ready());
        self.renderer.render(&swap_view, inputs.as_ref());

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);
        let hud = ui::draw_hud(
            &self.egui_ctx,
            &self.engine,
            &self.upload_failures,
            self.renderer.points.point_count(),
        );
        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output.clone());

        self.renderer.render_ui(&swap_view, &self.egui_ctx, egui_output);
        frame.present();

        if hud.reset {
            self.engine.reset_camera();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_keeps_pumping_frames() {
        assert_eq!(schedule(EngineState::Uninitialized, false), Schedule::Redraw);
        assert_eq!(schedule(EngineState::AssetsLoading, false), Schedule::Redraw);
    }

    #[test]
    fn rendering_follows_the_loop_token() {
        assert_eq!(schedule(EngineState::Rendering, true), Schedule::Redraw);
        assert_eq!(schedule(EngineState::Rendering, false), Schedule::Exit);
        assert_eq!(schedule(EngineState::Disposed, false), Schedule::Exit);
    }

    #[test]
    fn disposing_the_engine_stops_the_held_token() {
        let mut engine = RenderEngine::new();
        engine.document_loaded(Viewport::new(64, 64)).unwrap();
        let token = engine.loop_token();
        assert_eq!(schedule(engine.state(), token.is_running()), Schedule::Redraw);

        engine
            .color_decoded(Ok(ColorImage::filled(2, 2, [0, 0, 0]).unwrap()))
            .unwrap();
        assert_eq!(schedule(engine.state(), token.is_running()), Schedule::Redraw);

        engine.dispose();
        assert_eq!(schedule(engine.state(), token.is_running()), Schedule::Exit);
    }

    #[test]
    fn placeholders_are_single_texels() {
        assert_eq!(color_placeholder().pixel(0, 0), COLOR_PLACEHOLDER);
        assert_eq!(depth_placeholder().as_raw(), &[0]);
    }
}
