//! Error types shared across the crate.

use crate::raster::Dimensions;
use crate::template::Slot;
use thiserror::Error;

/// Which of the two embedded rasters an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Color,
    Depth,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AssetKind::Color => "color",
            AssetKind::Depth => "depth",
        })
    }
}

/// Invalid raster construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    #[error("raster must be at least 1x1, got {0}")]
    ZeroSized(Dimensions),

    #[error("{dims} raster with {channels} channel(s) needs {expected} bytes, got {actual}")]
    BufferLength {
        dims: Dimensions,
        channels: usize,
        expected: usize,
        actual: usize,
    },
}

/// Failures while assembling the viewer template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template slot {0} was never bound")]
    UnboundSlot(Slot),

    #[error("template slot {0} appears more than once")]
    DuplicateSlot(Slot),

    #[error("template has no {0} slot")]
    MissingSlot(Slot),
}

/// Build-time failures. Any of these aborts document creation.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("color image is {color} but depth map is {depth}")]
    DimensionMismatch { color: Dimensions, depth: Dimensions },

    #[error("failed to encode {asset} asset")]
    Encoding {
        asset: AssetKind,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// An embedded asset reference could not be turned back into a raster.
#[derive(Debug, Error)]
pub enum AssetDecodeError {
    #[error("malformed data URI: {0}")]
    MalformedUri(String),

    #[error("unsupported asset MIME type `{0}`")]
    UnsupportedMime(String),

    #[error("invalid base64 payload")]
    Base64(#[from] base64::DecodeError),

    #[error("image payload could not be decoded")]
    Image(#[from] image::ImageError),

    #[error("document has no {0} asset reference")]
    NotFound(AssetKind),
}

/// Event delivered to the render engine in a state that cannot accept it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("cannot handle `{event}` while {from:?}")]
    InvalidTransition {
        from: crate::engine::EngineState,
        event: &'static str,
    },
}
