//! Input preparation ahead of the builder: width capping and depth sourcing.

use crate::raster::{ColorImage, DepthMap, Dimensions};
use image::imageops::{self, FilterType};

/// Default cap on color image width, in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 512;

/// Downscales `image` with Lanczos3 when it is wider than `max_width`,
/// keeping the aspect ratio. `max_width == 0` disables the cap.
pub fn fit_width(image: &ColorImage, max_width: u32) -> ColorImage {
    let dims = image.dimensions();
    if max_width == 0 || dims.width <= max_width {
        return image.clone();
    }

    let target = fitted_dimensions(dims, max_width);
    log::debug!("Resizing {} -> {} (Lanczos3)", dims, target);

    let resized = imageops::resize(
        &image.clone().into_rgb_image(),
        target.width,
        target.height,
        FilterType::Lanczos3,
    );
    ColorImage::from(resized)
}

/// `(max_width, max_width * h / w)`, height truncated and at least 1.
pub fn fitted_dimensions(dims: Dimensions, max_width: u32) -> Dimensions {
    let h = (u64::from(max_width) * u64::from(dims.height) / u64::from(dims.width)).max(1);
    Dimensions::new(max_width, h as u32)
}

/// Applies [`fit_width`] to `color` and pairs the result with `depth`.
///
/// A depth map that matched the photo before downscaling follows it. Any
/// other mismatch is resampled only when `resample_depth` is set.
pub fn fit_pair(
    color: &ColorImage,
    depth: DepthMap,
    max_width: u32,
    resample_depth: bool,
) -> anyhow::Result<(ColorImage, DepthMap)> {
    let original = color.dimensions();
    let color = fit_width(color, max_width);
    let follows = color.dimensions() != original && depth.dimensions() == original;

    let estimator = PrecomputedDepth::new(depth).resample_to_color(resample_depth || follows);
    let depth = estimator.estimate(&color)?;
    Ok((color, depth))
}

/// Produces a depth map for a color image.
///
/// Implementations are constructed explicitly by the caller and passed by
/// reference; model weights or other heavy state live inside the value.
pub trait DepthEstimator {
    fn estimate(&self, image: &ColorImage) -> anyhow::Result<DepthMap>;
}

/// Depth computed elsewhere and loaded from disk.
#[derive(Debug, Clone)]
pub struct PrecomputedDepth {
    depth: DepthMap,
    resample_to_color: bool,
}

impl PrecomputedDepth {
    pub fn new(depth: DepthMap) -> Self {
        Self {
            depth,
            resample_to_color: false,
        }
    }

    /// Resample to the color image's dimensions when they differ. Off by
    /// default so a mismatch reaches the builder's validation instead.
    pub fn resample_to_color(mut self, enabled: bool) -> Self {
        self.resample_to_color = enabled;
        self
    }
}

impl DepthEstimator for PrecomputedDepth {
    fn estimate(&self, image: &ColorImage) -> anyhow::Result<DepthMap> {
        let want = image.dimensions();
        let have = self.depth.dimensions();
        if !self.resample_to_color || want == have {
            return Ok(self.depth.clone());
        }

        log::info!("Resampling depth map {} -> {}", have, want);
        let resized = imageops::resize(
            &self.depth.clone().into_gray_image(),
            want.width,
            want.height,
            FilterType::CatmullRom,
        );
        Ok(DepthMap::from(resized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_images_pass_through() {
        let img = ColorImage::filled(300, 200, [10, 20, 30]).unwrap();
        assert_eq!(fit_width(&img, DEFAULT_MAX_WIDTH), img);
        let wide = ColorImage::filled(2000, 10, [0, 0, 0]).unwrap();
        assert_eq!(fit_width(&wide, 0).dimensions(), Dimensions::new(2000, 10));
    }

    #[test]
    fn wide_images_shrink_to_cap_keeping_aspect() {
        let img = ColorImage::filled(1024, 768, [200, 100, 50]).unwrap();
        let out = fit_width(&img, 512);
        assert_eq!(out.dimensions(), Dimensions::new(512, 384));
        assert_eq!(out.pixel(100, 100), [200, 100, 50]);
    }

    #[test]
    fn fitted_height_truncates_but_never_hits_zero() {
        assert_eq!(fitted_dimensions(Dimensions::new(1000, 333), 512), Dimensions::new(512, 170));
        assert_eq!(fitted_dimensions(Dimensions::new(4000, 1), 512), Dimensions::new(512, 1));
    }

    #[test]
    fn depth_follows_a_downscaled_photo() {
        let color = ColorImage::filled(1024, 10, [0, 0, 0]).unwrap();
        let depth = DepthMap::filled(1024, 10, 40).unwrap();
        let (color, depth) = fit_pair(&color, depth, DEFAULT_MAX_WIDTH, false).unwrap();
        assert_eq!(color.dimensions(), Dimensions::new(512, 5));
        assert_eq!(depth.dimensions(), color.dimensions());
    }

    #[test]
    fn unrelated_depth_size_is_left_alone_unless_asked() {
        let color = ColorImage::filled(1024, 10, [0, 0, 0]).unwrap();
        let depth = DepthMap::filled(7, 3, 40).unwrap();
        let (_, kept) = fit_pair(&color, depth.clone(), DEFAULT_MAX_WIDTH, false).unwrap();
        assert_eq!(kept.dimensions(), Dimensions::new(7, 3));
        let (_, resampled) = fit_pair(&color, depth, DEFAULT_MAX_WIDTH, true).unwrap();
        assert_eq!(resampled.dimensions(), Dimensions::new(512, 5));
    }

    #[test]
    fn precomputed_depth_is_returned_as_is_by_default() {
        let color = ColorImage::filled(8, 6, [0, 0, 0]).unwrap();
        let depth = DepthMap::filled(4, 3, 90).unwrap();
        let est = PrecomputedDepth::new(depth.clone());
        assert_eq!(est.estimate(&color).unwrap(), depth);
    }

    #[test]
    fn precomputed_depth_resamples_when_asked() {
        let color = ColorImage::filled(8, 6, [0, 0, 0]).unwrap();
        let est = PrecomputedDepth::new(DepthMap::filled(4, 3, 90).unwrap()).resample_to_color(true);
        let out = est.estimate(&color).unwrap();
        assert_eq!(out.dimensions(), color.dimensions());
        assert!(out.as_raw().iter().all(|&v| v == 90));
    }
}
