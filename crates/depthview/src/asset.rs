//! Embeddable, transport-ready encodings of the two rasters.
//!
//! Color is JPEG (lossy is fine, it is background detail). Depth is an 8-bit
//! grayscale PNG: depth quantization drives geometry directly, so it must be
//! lossless or the surface shows banding.

use crate::error::{AssetDecodeError, AssetKind, BuildError};
use crate::raster::{ColorImage, DepthMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";

/// Default JPEG quality for the color asset.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// An immutable compressed image plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    mime: &'static str,
    bytes: Vec<u8>,
}

impl EncodedAsset {
    /// JPEG-encodes the color raster. `quality` is clamped to `1..=100`.
    pub fn encode_color(image: &ColorImage, quality: u8) -> Result<Self, BuildError> {
        let mut bytes = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));

        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|source| BuildError::Encoding {
                asset: AssetKind::Color,
                source,
            })?;

        log::debug!(
            "Encoded {} color image as JPEG q={}: {} bytes",
            image.dimensions(),
            quality,
            bytes.len()
        );

        Ok(Self {
            mime: MIME_JPEG,
            bytes,
        })
    }

    /// PNG-encodes the depth raster as 8-bit grayscale.
    pub fn encode_depth(depth: &DepthMap) -> Result<Self, BuildError> {
        let mut bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut bytes);

        encoder
            .write_image(
                depth.as_raw(),
                depth.width(),
                depth.height(),
                ExtendedColorType::L8,
            )
            .map_err(|source| BuildError::Encoding {
                asset: AssetKind::Depth,
                source,
            })?;

        log::debug!(
            "Encoded {} depth map as PNG: {} bytes",
            depth.dimensions(),
            bytes.len()
        );

        Ok(Self {
            mime: MIME_PNG,
            bytes,
        })
    }

    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, AssetDecodeError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AssetDecodeError::MalformedUri("missing `data:` scheme".into()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AssetDecodeError::MalformedUri("missing `,` separator".into()))?;

        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| AssetDecodeError::MalformedUri("payload is not base64".into()))?;

        let mime = match mime {
            MIME_JPEG => MIME_JPEG,
            MIME_PNG => MIME_PNG,
            other => return Err(AssetDecodeError::UnsupportedMime(other.to_string())),
        };

        Ok(Self {
            mime,
            bytes: STANDARD.decode(payload)?,
        })
    }

    #[inline]
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The embeddable reference spliced into the viewer document.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    fn format(&self) -> ImageFormat {
        if self.mime == MIME_PNG {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        }
    }

    /// Decodes into an RGB raster regardless of the stored channel layout.
    pub fn decode_color(&self) -> Result<ColorImage, AssetDecodeError> {
        let img = image::load_from_memory_with_format(&self.bytes, self.format())?;
        Ok(ColorImage::from(&img))
    }

    /// Decodes into a single-channel depth raster.
    pub fn decode_depth(&self) -> Result<DepthMap, AssetDecodeError> {
        let img = image::load_from_memory_with_format(&self.bytes, self.format())?;
        Ok(DepthMap::from(&img))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_depth(w: u32, h: u32) -> DepthMap {
        let values = (0..w * h).map(|i| (i % 256) as u8).collect();
        DepthMap::new(w, h, values).unwrap()
    }

    #[test]
    fn depth_png_is_lossless() {
        let depth = gradient_depth(37, 11);
        let asset = EncodedAsset::encode_depth(&depth).unwrap();
        assert_eq!(asset.mime(), MIME_PNG);

        let parsed = EncodedAsset::from_data_uri(&asset.to_data_uri()).unwrap();
        assert_eq!(parsed, asset);
        assert_eq!(parsed.decode_depth().unwrap(), depth);
    }

    #[test]
    fn color_jpeg_keeps_dimensions() {
        let img = ColorImage::filled(64, 48, [200, 100, 50]).unwrap();
        let asset = EncodedAsset::encode_color(&img, DEFAULT_JPEG_QUALITY).unwrap();
        assert!(asset.to_data_uri().starts_with("data:image/jpeg;base64,"));

        let decoded = asset.decode_color().unwrap();
        assert_eq!(decoded.dimensions(), img.dimensions());

        let [r, g, b] = decoded.pixel(10, 10);
        assert!((r as i32 - 200).abs() <= 4);
        assert!((g as i32 - 100).abs() <= 4);
        assert!((b as i32 - 50).abs() <= 4);
    }

    #[test]
    fn rejects_non_data_uri() {
        assert!(matches!(
            EncodedAsset::from_data_uri("https://example.com/a.png"),
            Err(AssetDecodeError::MalformedUri(_))
        ));
        assert!(matches!(
            EncodedAsset::from_data_uri("data:image/gif;base64,R0lGOD"),
            Err(AssetDecodeError::UnsupportedMime(m)) if m == "image/gif"
        ));
        assert!(matches!(
            EncodedAsset::from_data_uri("data:image/png;base64,@@@"),
            Err(AssetDecodeError::Base64(_))
        ));
    }

    #[test]
    fn garbage_payload_fails_to_decode() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(b"not a png"));
        let asset = EncodedAsset::from_data_uri(&uri).unwrap();
        assert!(matches!(
            asset.decode_depth(),
            Err(AssetDecodeError::Image(_))
        ));
    }
}
