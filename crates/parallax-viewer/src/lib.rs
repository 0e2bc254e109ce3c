//! Native depth-parallax viewer.
//!
//! Hosts the `depthview` render engine in a winit window: assets decode on
//! rayon workers, the point grid is drawn as instanced sprites with wgpu, and
//! egui provides the HUD.

pub mod app;
pub mod data;
pub mod input;
pub mod loader;
pub mod renderer;
pub mod ui;
