//! GPU-facing data for the parallax viewer: uniform layouts and texture uploads.

pub mod textures;
pub mod types;

pub use self::types::{FrameUniformStd140, GridInstance};
