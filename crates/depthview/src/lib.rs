//! depthview: interactive depth-parallax viewers from a photo and a depth map.
//!
//! Two halves:
//! - The document builder ([`builder`]) encodes a [`ColorImage`] and its
//!   aligned [`DepthMap`] as data URIs and substitutes them into a viewer
//!   template, producing one self-contained HTML document that needs nothing
//!   but the pinned three.js runtime.
//! - The render engine ([`engine`]) is the host-agnostic core of the
//!   viewer: load state machine, point grid, orbit camera and render-loop
//!   handle. The browser script in the template and the native
//!   `parallax_viewer` both follow it.
//!
//! Each image pixel becomes one point. At draw time its depth `d` pushes it
//! along +Z by `d` and scales its planar position by `2 - d`
//! (see [`displacement`]).
//!
//! ```no_run
//! use depthview::{build, ColorImage, DepthMap};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let color = ColorImage::filled(512, 384, [128, 128, 128])?;
//! let depth = DepthMap::filled(512, 384, 128)?;
//! let doc = build(&color, &depth)?;
//! std::fs::write("viewer.html", doc.html())?;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod builder;
pub mod camera;
pub mod displacement;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod prep;
pub mod raster;
pub mod template;

pub use asset::EncodedAsset;
pub use builder::{build, BuildOptions, ViewerBuilder};
pub use camera::{CameraControls, OrbitCamera};
pub use document::{EmbedOptions, ViewerDocument};
pub use engine::{EngineState, FrameInputs, RenderEngine, RenderLoop, Viewport};
pub use error::{AssetDecodeError, AssetKind, BuildError, EngineError, RasterError, TemplateError};
pub use geometry::PointGrid;
pub use prep::{DepthEstimator, PrecomputedDepth};
pub use raster::{ColorImage, DepthMap, Dimensions};
