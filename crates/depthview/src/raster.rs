//! In-memory rasters handed to the builder by the depth-estimation collaborator.
//!
//! Both rasters are row-major with the top row first. Depth values are
//! relative intensities (0 = one end of the scene, 255 = the other); no metric
//! units are implied.

use crate::error::RasterError;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `width / height`.
    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[inline]
    pub fn max_side(self) -> u32 {
        self.width.max(self.height)
    }

    #[inline]
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    fn check(self, channels: usize, actual: usize) -> Result<(), RasterError> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::ZeroSized(self));
        }

        let expected = self.pixel_count() * channels;
        if expected != actual {
            return Err(RasterError::BufferLength {
                dims: self,
                channels,
                expected,
                actual,
            });
        }

        Ok(())
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 8-bit RGB photograph. Source of truth for surface appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorImage {
    dims: Dimensions,
    rgb: Vec<u8>,
}

impl ColorImage {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, RasterError> {
        let dims = Dimensions::new(width, height);
        dims.check(3, rgb.len())?;
        Ok(Self { dims, rgb })
    }

    /// A single-color image.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, RasterError> {
        let dims = Dimensions::new(width, height);
        dims.check(3, dims.pixel_count() * 3)?;
        let data = rgb.repeat(dims.pixel_count());
        Ok(Self { dims, rgb: data })
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dims.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dims.height
    }

    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.rgb
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.dims.width as usize + x as usize) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    /// Expands to RGBA8 with opaque alpha, the layout GPU uploads expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.dims.pixel_count() * 4);
        for px in self.rgb.chunks_exact(3) {
            out.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        out
    }

    pub fn into_rgb_image(self) -> image::RgbImage {
        // Length was validated on construction.
        image::RgbImage::from_raw(self.dims.width, self.dims.height, self.rgb)
            .unwrap_or_else(|| unreachable!("ColorImage buffer length is validated"))
    }
}

impl From<image::RgbImage> for ColorImage {
    fn from(img: image::RgbImage) -> Self {
        let dims = Dimensions::new(img.width(), img.height());
        Self {
            dims,
            rgb: img.into_raw(),
        }
    }
}

impl From<&image::DynamicImage> for ColorImage {
    fn from(img: &image::DynamicImage) -> Self {
        img.to_rgb8().into()
    }
}

/// Single-channel relative depth, same pixel grid as the matching [`ColorImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthMap {
    dims: Dimensions,
    values: Vec<u8>,
}

impl DepthMap {
    pub fn new(width: u32, height: u32, values: Vec<u8>) -> Result<Self, RasterError> {
        let dims = Dimensions::new(width, height);
        dims.check(1, values.len())?;
        Ok(Self { dims, values })
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, RasterError> {
        let dims = Dimensions::new(width, height);
        dims.check(1, dims.pixel_count())?;
        Ok(Self {
            dims,
            values: vec![value; dims.pixel_count()],
        })
    }

    /// Quantizes raw model output the way the upstream app does:
    /// `v * 255 / max(v)`, truncated. A non-positive or non-finite maximum
    /// yields an all-zero map.
    pub fn from_relative(values: &[f32], width: u32, height: u32) -> Result<Self, RasterError> {
        let dims = Dimensions::new(width, height);
        dims.check(1, values.len())?;

        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let quantized = if max.is_finite() && max > 0.0 {
            values
                .iter()
                .map(|&v| (v * 255.0 / max).clamp(0.0, 255.0) as u8)
                .collect()
        } else {
            vec![0; values.len()]
        };

        Ok(Self {
            dims,
            values: quantized,
        })
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dims.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dims.height
    }

    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.values
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.values[y as usize * self.dims.width as usize + x as usize]
    }

    /// Depth at `(x, y)` normalized to `[0, 1]`, as a shader would read it.
    #[inline]
    pub fn normalized(&self, x: u32, y: u32) -> f32 {
        self.get(x, y) as f32 / 255.0
    }

    pub fn into_gray_image(self) -> image::GrayImage {
        image::GrayImage::from_raw(self.dims.width, self.dims.height, self.values)
            .unwrap_or_else(|| unreachable!("DepthMap buffer length is validated"))
    }
}

impl From<image::GrayImage> for DepthMap {
    fn from(img: image::GrayImage) -> Self {
        let dims = Dimensions::new(img.width(), img.height());
        Self {
            dims,
            values: img.into_raw(),
        }
    }
}

impl From<&image::DynamicImage> for DepthMap {
    fn from(img: &image::DynamicImage) -> Self {
        img.to_luma8().into()
    }
}
