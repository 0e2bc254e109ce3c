//! Entry point for the native parallax viewer.

use anyhow::{bail, Result};
use clap::Parser;
use parallax_viewer::{
    app::{App, Schedule},
    loader::{read_assets, spawn_decode, AssetSource},
};
use std::{path::PathBuf, sync::Arc};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

/// Interactive depth-parallax viewer for a photo and its depth map.
#[derive(Parser, Debug)]
#[command(name = "parallax_viewer", version)]
struct Args {
    /// Viewer document produced by `depth2view`.
    #[arg(long, conflicts_with_all = ["image", "depth"])]
    document: Option<PathBuf>,

    /// Color photograph; requires `--depth`.
    #[arg(long, requires = "depth")]
    image: Option<PathBuf>,

    /// Depth map aligned with `--image`.
    #[arg(long, requires = "image")]
    depth: Option<PathBuf>,

    /// Point sprite size in pixels.
    #[arg(long, default_value_t = depthview::engine::DEFAULT_POINT_SIZE_PX)]
    point_size: f32,
}

impl Args {
    fn source(&self) -> Result<AssetSource> {
        match (&self.document, &self.image, &self.depth) {
            (Some(doc), _, _) => Ok(AssetSource::Document(doc.clone())),
            (None, Some(image), Some(depth)) => Ok(AssetSource::Files {
                image: image.clone(),
                depth: depth.clone(),
            }),
            _ => bail!("pass --document, or both --image and --depth"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let (color, depth) = read_assets(&args.source()?)?;
    let events = spawn_decode(color, depth);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Depth Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 600))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), events, args.point_size))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => app.dispose(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                app.dispose();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.render(&window) {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                app.resize(app.renderer.gfx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory, exiting.");
                                app.dispose();
                            }
                            Err(e) => log::error!("Render error: {:?}", e),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => match app.schedule() {
                Schedule::Redraw => window.request_redraw(),
                Schedule::Exit => elwt.exit(),
            },
            _ => {}
        }
    })?;

    Ok(())
}
