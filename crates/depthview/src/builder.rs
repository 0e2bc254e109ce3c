//! Viewer Document Builder: two rasters in, one self-contained document out.

use crate::asset::{EncodedAsset, DEFAULT_JPEG_QUALITY};
use crate::document::ViewerDocument;
use crate::error::BuildError;
use crate::raster::{ColorImage, DepthMap};
use crate::template::{Slot, SlotBindings, Template};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// JPEG quality of the color asset, `1..=100`.
    pub jpeg_quality: u8,
    /// Reject color/depth pairs whose pixel dimensions differ.
    ///
    /// When disabled, matching dimensions are the caller's responsibility;
    /// a mismatch renders misaligned but never fails.
    pub validate_dimensions: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            validate_dimensions: true,
        }
    }
}

/// Builds viewer documents with fixed options. Pure: no I/O, no shared state.
#[derive(Debug, Clone, Default)]
pub struct ViewerBuilder {
    opts: BuildOptions,
}

impl ViewerBuilder {
    pub fn new(opts: BuildOptions) -> Self {
        Self { opts }
    }

    #[inline]
    pub fn options(&self) -> &BuildOptions {
        &self.opts
    }

    pub fn build(&self, color: &ColorImage, depth: &DepthMap) -> Result<ViewerDocument, BuildError> {
        if self.opts.validate_dimensions && color.dimensions() != depth.dimensions() {
            return Err(BuildError::DimensionMismatch {
                color: color.dimensions(),
                depth: depth.dimensions(),
            });
        }

        let template = Template::viewer()?;

        let color_asset = EncodedAsset::encode_color(color, self.opts.jpeg_quality)?;
        let depth_asset = EncodedAsset::encode_depth(depth)?;

        let color_uri = color_asset.to_data_uri();
        let depth_uri = depth_asset.to_data_uri();

        let html = template.render(
            &SlotBindings::new()
                .bind(Slot::ColorUrl, &color_uri)
                .bind(Slot::DepthUrl, &depth_uri),
        )?;

        log::debug!(
            "Built viewer document for {} image: {} bytes (color {} B, depth {} B)",
            color.dimensions(),
            html.len(),
            color_asset.bytes().len(),
            depth_asset.bytes().len()
        );

        Ok(ViewerDocument::new(html, color_asset, depth_asset))
    }
}

/// Builds a document with [`BuildOptions::default`].
pub fn build(color: &ColorImage, depth: &DepthMap) -> Result<ViewerDocument, BuildError> {
    ViewerBuilder::default().build(color, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetKind;
    use crate::raster::Dimensions;

    fn checkerboard(w: u32, h: u32) -> ColorImage {
        let mut rgb = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = if (x / 8 + y / 8) % 2 == 0 { 230 } else { 20 };
                rgb.extend_from_slice(&[v, 255 - v, v / 2]);
            }
        }
        ColorImage::new(w, h, rgb).unwrap()
    }

    fn ramp(w: u32, h: u32) -> DepthMap {
        let values = (0..h)
            .flat_map(|y| (0..w).map(move |x| ((x + y) * 255 / (w + h - 2).max(1)) as u8))
            .collect();
        DepthMap::new(w, h, values).unwrap()
    }

    #[test]
    fn document_embeds_each_asset_once_and_no_markers() {
        let color = checkerboard(40, 30);
        let depth = ramp(40, 30);
        let doc = build(&color, &depth).unwrap();
        let html = doc.html();

        for slot in Slot::ALL {
            assert!(!html.contains(slot.marker()), "{slot} marker left in output");
        }
        assert_eq!(html.matches(&doc.color_asset().to_data_uri()).count(), 1);
        assert_eq!(html.matches(&doc.depth_asset().to_data_uri()).count(), 1);
    }

    #[test]
    fn only_external_references_are_the_pinned_libraries() {
        let doc = build(&checkerboard(4, 4), &ramp(4, 4)).unwrap();
        let externals: Vec<&str> = doc
            .html()
            .match_indices("https://")
            .map(|(at, _)| {
                let rest = &doc.html()[at..];
                &rest[..rest.find('"').unwrap()]
            })
            .collect();
        assert_eq!(
            externals,
            vec![
                "https://cdnjs.cloudflare.com/ajax/libs/three.js/r128/three.min.js",
                "https://cdn.jsdelivr.net/npm/three@0.128.0/examples/js/controls/OrbitControls.js",
            ]
        );
    }

    #[test]
    fn build_is_deterministic() {
        let color = checkerboard(33, 17);
        let depth = ramp(33, 17);
        let a = build(&color, &depth).unwrap();
        let b = build(&color, &depth).unwrap();
        assert_eq!(a.html(), b.html());
        assert_eq!(a.to_data_uri(), b.to_data_uri());
    }

    #[test]
    fn rebuilding_decodes_to_identical_pixels() {
        let color = checkerboard(24, 24);
        let depth = ramp(24, 24);
        let (c1, d1) = ViewerDocument::extract_assets(build(&color, &depth).unwrap().html()).unwrap();
        let (c2, d2) = ViewerDocument::extract_assets(build(&color, &depth).unwrap().html()).unwrap();
        assert_eq!(c1.decode_color().unwrap(), c2.decode_color().unwrap());
        assert_eq!(d1.decode_depth().unwrap(), d2.decode_depth().unwrap());
    }

    #[test]
    fn embedded_assets_round_trip_dimensions() {
        let color = checkerboard(51, 29);
        let depth = ramp(51, 29);
        let doc = build(&color, &depth).unwrap();

        let parsed = ViewerDocument::from_html(doc.html().to_string()).unwrap();
        assert_eq!(parsed, doc);

        let c = parsed.color_asset().decode_color().unwrap();
        let d = parsed.depth_asset().decode_depth().unwrap();
        assert_eq!(c.dimensions(), color.dimensions());
        assert_eq!(d, depth);
    }

    #[test]
    fn single_pixel_pair_builds() {
        let color = ColorImage::filled(1, 1, [1, 2, 3]).unwrap();
        let depth = DepthMap::filled(1, 1, 77).unwrap();
        let doc = build(&color, &depth).unwrap();
        let (_, d) = ViewerDocument::extract_assets(doc.html()).unwrap();
        assert_eq!(d.decode_depth().unwrap().as_raw(), &[77]);
    }

    #[test]
    fn mismatched_dimensions_fail_before_encoding() {
        let color = ColorImage::filled(512, 384, [0, 0, 0]).unwrap();
        let depth = DepthMap::filled(256, 192, 0).unwrap();
        match build(&color, &depth) {
            Err(BuildError::DimensionMismatch { color, depth }) => {
                assert_eq!(color, Dimensions::new(512, 384));
                assert_eq!(depth, Dimensions::new(256, 192));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn mismatch_is_callers_problem_without_validation() {
        let color = ColorImage::filled(8, 6, [9, 9, 9]).unwrap();
        let depth = DepthMap::filled(4, 3, 200).unwrap();
        let builder = ViewerBuilder::new(BuildOptions {
            validate_dimensions: false,
            ..BuildOptions::default()
        });
        let doc = builder.build(&color, &depth).unwrap();
        assert_eq!(
            doc.depth_asset().decode_depth().unwrap().dimensions(),
            Dimensions::new(4, 3)
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: BuildOptions = serde_json::from_str(r#"{ "jpeg_quality": 75 }"#).unwrap();
        assert_eq!(opts.jpeg_quality, 75);
        assert!(opts.validate_dimensions);
    }

    #[test]
    fn encoder_failure_names_the_color_asset() {
        // Wider than a JPEG frame can describe.
        let color = ColorImage::filled(70_000, 1, [0, 0, 0]).unwrap();
        let depth = DepthMap::filled(70_000, 1, 0).unwrap();
        match build(&color, &depth) {
            Err(BuildError::Encoding { asset, .. }) => assert_eq!(asset, AssetKind::Color),
            other => panic!("expected an encoding error, got {other:?}"),
        }
    }
}
