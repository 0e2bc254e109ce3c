//! Host-agnostic render engine core.
//!
//! A host (the browser script, or the native `parallax_viewer`) feeds the
//! engine its asynchronous events and asks it for per-frame inputs. The
//! engine owns the scene bindings, the camera controls and the render-loop
//! handle; the host owns the graphics context.
//!
//! ```text
//! Uninitialized --document_loaded--> AssetsLoading --color_decoded--> Ready --> Rendering
//!        \______________________________ dispose ______________________________/--> Disposed
//! ```
//!
//! Depth is not awaited. Until `depth_decoded` arrives the depth binding is a
//! 1x1 zero texel, so early frames show a flat surface.

use crate::camera::{CameraControls, OrbitCamera};
use crate::error::{AssetDecodeError, AssetKind, EngineError};
use crate::geometry::PointGrid;
use crate::raster::{ColorImage, DepthMap, Dimensions};
use glam::Mat4;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Point sprite size in pixels.
pub const DEFAULT_POINT_SIZE_PX: f32 = 2.0;

/// Texel bound in place of a color image that could not be used.
pub const COLOR_PLACEHOLDER: [u8; 3] = [255, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    AssetsLoading,
    Ready,
    Rendering,
    Disposed,
}

/// Where a texture binding stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    /// Still decoding; a placeholder is bound.
    Pending,
    Bound,
    /// Decoding failed; the placeholder stays bound.
    Failed,
}

/// Output surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// A texture binding plus a revision counter hosts use to detect re-uploads.
#[derive(Debug, Clone)]
pub struct TextureBinding<T> {
    texels: T,
    status: BindingStatus,
    revision: u64,
}

impl<T> TextureBinding<T> {
    fn placeholder(texels: T) -> Self {
        Self {
            texels,
            status: BindingStatus::Pending,
            revision: 0,
        }
    }

    fn bind(&mut self, texels: T, status: BindingStatus) {
        self.texels = texels;
        self.status = status;
        self.revision += 1;
    }

    #[inline]
    pub fn texels(&self) -> &T {
        &self.texels
    }

    #[inline]
    pub fn status(&self) -> BindingStatus {
        self.status
    }

    /// Increments every time new texels are bound.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Geometry and shader inputs built on entering `Ready`.
#[derive(Debug, Clone)]
pub struct SceneBindings {
    pub grid: PointGrid,
    /// `width / height` of the color image.
    pub ar: f32,
}

/// Everything a host needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub frame_index: u64,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub ar: f32,
    pub point_size_px: f32,
    pub viewport: Viewport,
    pub depth_status: BindingStatus,
}

/// Owner-held stop signal for a perpetual render loop.
///
/// Hosts hold a [`LoopToken`] and poll it before scheduling the next frame;
/// once it reads stopped they stop scheduling. Dropping the handle stops the
/// loop.
#[derive(Debug, Default)]
pub struct RenderLoop {
    running: Arc<AtomicBool>,
}

/// Read-only view of a [`RenderLoop`] for the code that schedules frames.
#[derive(Debug, Clone)]
pub struct LoopToken {
    running: Arc<AtomicBool>,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn token(&self) -> LoopToken {
        LoopToken {
            running: self.running.clone(),
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl LoopToken {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Render engine state for one viewer session.
#[derive(Debug)]
pub struct RenderEngine {
    state: EngineState,
    viewport: Viewport,
    controls: Option<CameraControls>,
    scene: Option<SceneBindings>,
    color: TextureBinding<ColorImage>,
    depth: TextureBinding<DepthMap>,
    failures: Vec<(AssetKind, AssetDecodeError)>,
    render_loop: RenderLoop,
    frame_index: u64,
    point_size_px: f32,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            viewport: Viewport::new(1, 1),
            controls: None,
            scene: None,
            color: TextureBinding::placeholder(solid_color([255, 255, 255])),
            depth: TextureBinding::placeholder(flat_depth()),
            failures: Vec::new(),
            render_loop: RenderLoop::new(),
            frame_index: 0,
            point_size_px: DEFAULT_POINT_SIZE_PX,
        }
    }

    pub fn with_point_size(mut self, px: f32) -> Self {
        self.point_size_px = px.max(1.0);
        self
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn scene(&self) -> Option<&SceneBindings> {
        self.scene.as_ref()
    }

    #[inline]
    pub fn color(&self) -> &TextureBinding<ColorImage> {
        &self.color
    }

    #[inline]
    pub fn depth(&self) -> &TextureBinding<DepthMap> {
        &self.depth
    }

    #[inline]
    pub fn controls(&self) -> Option<&CameraControls> {
        self.controls.as_ref()
    }

    /// Input handlers mutate the camera through this. `None` before load or
    /// after disposal.
    #[inline]
    pub fn controls_mut(&mut self) -> Option<&mut CameraControls> {
        self.controls.as_mut()
    }

    /// Asset decode failures seen so far.
    #[inline]
    pub fn failures(&self) -> &[(AssetKind, AssetDecodeError)] {
        &self.failures
    }

    pub fn loop_token(&self) -> LoopToken {
        self.render_loop.token()
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn invalid(&self, event: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            from: self.state,
            event,
        }
    }

    fn transition(&mut self, to: EngineState) {
        log::debug!("Render engine {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    /// The host finished parsing the document: set up camera and controls.
    pub fn document_loaded(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        if self.state != EngineState::Uninitialized {
            return Err(self.invalid("document_loaded"));
        }

        self.viewport = viewport;
        self.controls = Some(CameraControls::new(OrbitCamera::new(viewport.aspect())));
        self.transition(EngineState::AssetsLoading);
        Ok(())
    }

    /// The color asset resolved. Enters `Ready` then `Rendering`.
    ///
    /// A decode failure binds a 1x1 magenta placeholder instead, so the loop
    /// still starts and the failure is visible.
    pub fn color_decoded(
        &mut self,
        result: Result<ColorImage, AssetDecodeError>,
    ) -> Result<(), EngineError> {
        if self.state != EngineState::AssetsLoading {
            return Err(self.invalid("color_decoded"));
        }

        let (image, status) = match result {
            Ok(image) => (image, BindingStatus::Bound),
            Err(err) => {
                log::warn!("Color asset failed to decode: {err}");
                self.failures.push((AssetKind::Color, err));
                (solid_color(COLOR_PLACEHOLDER), BindingStatus::Failed)
            }
        };

        let grid = PointGrid::new(image.dimensions());
        let ar = grid.aspect_ratio();
        self.color.bind(image, status);
        self.scene = Some(SceneBindings { grid, ar });
        self.transition(EngineState::Ready);

        self.render_loop.start();
        self.transition(EngineState::Rendering);
        Ok(())
    }

    /// The depth asset resolved. Accepted whenever assets may be loading,
    /// including before color. Late arrivals after disposal are dropped.
    pub fn depth_decoded(
        &mut self,
        result: Result<DepthMap, AssetDecodeError>,
    ) -> Result<(), EngineError> {
        match self.state {
            EngineState::Uninitialized => return Err(self.invalid("depth_decoded")),
            EngineState::Disposed => {
                log::debug!("Dropping depth asset that resolved after disposal");
                return Ok(());
            }
            EngineState::AssetsLoading | EngineState::Ready | EngineState::Rendering => {}
        }

        match result {
            Ok(depth) => {
                if let Some(scene) = &self.scene {
                    if depth.dimensions() != scene.grid.dimensions() {
                        log::warn!(
                            "Depth map {} does not match image {}; sampling will misalign",
                            depth.dimensions(),
                            scene.grid.dimensions()
                        );
                    }
                }
                self.depth.bind(depth, BindingStatus::Bound);
            }
            Err(err) => {
                log::warn!("Depth asset failed to decode: {err}");
                self.failures.push((AssetKind::Depth, err));
                self.depth.bind(flat_depth(), BindingStatus::Failed);
            }
        }

        Ok(())
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(controls) = self.controls.as_mut() {
            controls.set_aspect(viewport.aspect());
        }
    }

    pub fn reset_camera(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.reset();
        }
    }

    /// Inputs for the next frame. `None` unless rendering and the loop is live.
    pub fn frame(&mut self) -> Option<FrameInputs> {
        if self.state != EngineState::Rendering || !self.render_loop.is_running() {
            return None;
        }

        let camera = self.controls.as_ref()?.camera();
        let scene = self.scene.as_ref()?;

        let inputs = FrameInputs {
            frame_index: self.frame_index,
            view: camera.view(),
            projection: camera.projection(),
            view_proj: camera.view_proj(),
            ar: scene.ar,
            point_size_px: self.point_size_px,
            viewport: self.viewport,
            depth_status: self.depth.status(),
        };

        self.frame_index += 1;
        Some(inputs)
    }

    /// Stops the loop and releases scene state. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }

        self.render_loop.stop();
        self.scene = None;
        self.controls = None;
        self.color = TextureBinding::placeholder(solid_color([255, 255, 255]));
        self.depth = TextureBinding::placeholder(flat_depth());
        self.transition(EngineState::Disposed);
    }
}

fn solid_color(rgb: [u8; 3]) -> ColorImage {
    ColorImage::from(image::RgbImage::from_pixel(1, 1, image::Rgb(rgb)))
}

fn flat_depth() -> DepthMap {
    DepthMap::from(image::GrayImage::from_pixel(1, 1, image::Luma([0])))
}

impl SceneBindings {
    pub fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> RenderEngine {
        let mut engine = RenderEngine::new();
        engine.document_loaded(Viewport::new(800, 600)).unwrap();
        engine
    }

    fn bad_asset() -> AssetDecodeError {
        AssetDecodeError::MalformedUri("test".into())
    }

    #[test]
    fn happy_path_reaches_rendering() {
        let mut engine = loaded();
        assert_eq!(engine.state(), EngineState::AssetsLoading);
        assert!(engine.frame().is_none());

        engine
            .color_decoded(Ok(ColorImage::filled(512, 384, [1, 2, 3]).unwrap()))
            .unwrap();
        assert_eq!(engine.state(), EngineState::Rendering);
        assert!(engine.loop_token().is_running());

        let scene = engine.scene().unwrap();
        assert_eq!(scene.grid.len(), 512 * 384);
        assert_eq!(scene.ar, 512.0 / 384.0);

        let f0 = engine.frame().unwrap();
        let f1 = engine.frame().unwrap();
        assert_eq!((f0.frame_index, f1.frame_index), (0, 1));
        assert!(f0.view_proj.is_finite());
    }

    #[test]
    fn depth_race_renders_flat_until_depth_arrives() {
        let mut engine = loaded();
        engine
            .color_decoded(Ok(ColorImage::filled(4, 4, [0, 0, 0]).unwrap()))
            .unwrap();

        let early = engine.frame().unwrap();
        assert_eq!(early.depth_status, BindingStatus::Pending);
        assert_eq!(engine.depth().texels().as_raw(), &[0]);
        let rev = engine.depth().revision();

        engine
            .depth_decoded(Ok(DepthMap::filled(4, 4, 200).unwrap()))
            .unwrap();
        let late = engine.frame().unwrap();
        assert_eq!(late.depth_status, BindingStatus::Bound);
        assert!(engine.depth().revision() > rev);
    }

    #[test]
    fn depth_may_arrive_before_color() {
        let mut engine = loaded();
        engine
            .depth_decoded(Ok(DepthMap::filled(2, 2, 9).unwrap()))
            .unwrap();
        assert_eq!(engine.state(), EngineState::AssetsLoading);

        engine
            .color_decoded(Ok(ColorImage::filled(2, 2, [5, 5, 5]).unwrap()))
            .unwrap();
        assert_eq!(engine.frame().unwrap().depth_status, BindingStatus::Bound);
    }

    #[test]
    fn color_failure_shows_placeholder_and_keeps_rendering() {
        let mut engine = loaded();
        engine.color_decoded(Err(bad_asset())).unwrap();

        assert_eq!(engine.state(), EngineState::Rendering);
        assert_eq!(engine.color().status(), BindingStatus::Failed);
        assert_eq!(engine.color().texels().pixel(0, 0), COLOR_PLACEHOLDER);
        assert_eq!(engine.scene().unwrap().grid.len(), 1);
        assert_eq!(engine.failures().len(), 1);
        assert!(engine.frame().is_some());
    }

    #[test]
    fn depth_failure_keeps_flat_placeholder() {
        let mut engine = loaded();
        engine
            .color_decoded(Ok(ColorImage::filled(3, 3, [0, 0, 0]).unwrap()))
            .unwrap();
        engine.depth_decoded(Err(bad_asset())).unwrap();

        assert_eq!(engine.depth().status(), BindingStatus::Failed);
        assert_eq!(engine.depth().texels().as_raw(), &[0]);
        assert_eq!(engine.failures()[0].0, AssetKind::Depth);
        assert!(engine.frame().is_some());
    }

    #[test]
    fn single_pixel_scene_renders() {
        let mut engine = loaded();
        engine
            .color_decoded(Ok(ColorImage::filled(1, 1, [0, 0, 0]).unwrap()))
            .unwrap();
        engine
            .depth_decoded(Ok(DepthMap::filled(1, 1, 128).unwrap()))
            .unwrap();
        let frame = engine.frame().unwrap();
        assert_eq!(frame.ar, 1.0);
        assert_eq!(engine.scene().unwrap().grid.positions(), &[[0.0, 0.0]]);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut engine = RenderEngine::new();
        assert_eq!(
            engine.color_decoded(Ok(ColorImage::filled(1, 1, [0, 0, 0]).unwrap())),
            Err(EngineError::InvalidTransition {
                from: EngineState::Uninitialized,
                event: "color_decoded",
            })
        );
        assert!(engine.depth_decoded(Ok(DepthMap::filled(1, 1, 0).unwrap())).is_err());

        engine.document_loaded(Viewport::new(10, 10)).unwrap();
        assert!(engine.document_loaded(Viewport::new(10, 10)).is_err());
    }

    #[test]
    fn dispose_stops_loop_and_ignores_late_assets() {
        let mut engine = loaded();
        engine
            .color_decoded(Ok(ColorImage::filled(2, 2, [0, 0, 0]).unwrap()))
            .unwrap();
        let token = engine.loop_token();
        assert!(token.is_running());

        engine.dispose();
        engine.dispose();
        assert_eq!(engine.state(), EngineState::Disposed);
        assert!(!token.is_running());
        assert!(engine.frame().is_none());
        assert!(engine.controls().is_none());
        assert!(engine
            .depth_decoded(Ok(DepthMap::filled(2, 2, 1).unwrap()))
            .is_ok());
    }

    #[test]
    fn dropping_the_loop_handle_stops_it() {
        let token = {
            let handle = RenderLoop::new();
            handle.start();
            handle.token()
        };
        assert!(!token.is_running());
    }

    #[test]
    fn reset_goes_through_engine() {
        let mut engine = loaded();
        engine.controls_mut().unwrap().zoom(5.0);
        engine.reset_camera();
        let controls = engine.controls().unwrap();
        assert_eq!(controls.camera(), controls.initial());
    }
}
