//! Rendering orchestrator. Owns the GPU context, the depth target, the point
//! pipeline and the egui renderer.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{context::GfxContext, pipelines::parallax::ParallaxPipeline, targets::Targets};
use crate::data::types::FrameUniformStd140;
use depthview::FrameInputs;
use std::sync::Arc;
use winit::window::Window;

/// Viewer background.
const CLEAR: wgpu::Color = wgpu::Color::WHITE;

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: ParallaxPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let targets = Targets::new(&gfx.device, gfx.size);
        let points = ParallaxPipeline::new(&gfx.device, gfx.config.format, targets::DEPTH_FORMAT);
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    /// Clears to the background and draws the points when `frame` is given
    /// and the scene is fully bound.
    pub fn render(&mut self, swap_view: &wgpu::TextureView, frame: Option<&FrameInputs>) {
        if let Some(frame) = frame {
            self.points
                .write_frame(&self.gfx.queue, &FrameUniformStd140::from(frame));
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if frame.is_some() {
                self.points.draw(&mut pass);
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Paints tessellated egui output on top of the frame.
    pub fn render_ui(
        &mut self,
        swap_view: &wgpu::TextureView,
        ctx: &egui::Context,
        output: egui::FullOutput,
    ) {
        let shapes = ctx.tessellate(output.shapes, ctx.pixels_per_point());
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.config.width, self.gfx.config.height],
            pixels_per_point: ctx.pixels_per_point(),
        };

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }
        self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            &shapes,
            &screen,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
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
            self.egui_renderer.render(&mut pass, &shapes, &screen);
        }

        for id in &output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
