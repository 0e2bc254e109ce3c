//! The built viewer document and its embedding forms.

use crate::asset::EncodedAsset;
use crate::error::{AssetDecodeError, AssetKind};
use crate::template::Slot;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// How a host surface should frame the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedOptions {
    /// Fixed height of the host region, in CSS pixels.
    pub height_px: u32,
    /// CSS width of the host region.
    pub width: String,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            height_px: 600,
            width: "100%".to_string(),
        }
    }
}

/// A complete, dependency-free interactive viewer: markup, script, shaders
/// and both embedded assets. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerDocument {
    html: String,
    color: EncodedAsset,
    depth: EncodedAsset,
}

impl ViewerDocument {
    pub(crate) fn new(html: String, color: EncodedAsset, depth: EncodedAsset) -> Self {
        Self { html, color, depth }
    }

    #[inline]
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    #[inline]
    pub fn color_asset(&self) -> &EncodedAsset {
        &self.color
    }

    #[inline]
    pub fn depth_asset(&self) -> &EncodedAsset {
        &self.depth
    }

    /// The whole document as a `data:text/html;base64,...` reference.
    pub fn to_data_uri(&self) -> String {
        format!("data:text/html;base64,{}", STANDARD.encode(self.html.as_bytes()))
    }

    /// An `<iframe>` pointing at [`Self::to_data_uri`].
    pub fn to_iframe(&self, opts: &EmbedOptions) -> String {
        format!(
            r#"<iframe src="{}" height="{}" width="{}"></iframe>"#,
            self.to_data_uri(),
            opts.height_px,
            escape_attr(&opts.width),
        )
    }

    /// Recovers the color and depth assets from rendered viewer HTML.
    pub fn extract_assets(html: &str) -> Result<(EncodedAsset, EncodedAsset), AssetDecodeError> {
        let color = find_slot_value(html, Slot::ColorUrl)
            .ok_or(AssetDecodeError::NotFound(AssetKind::Color))?;
        let depth = find_slot_value(html, Slot::DepthUrl)
            .ok_or(AssetDecodeError::NotFound(AssetKind::Depth))?;

        Ok((
            EncodedAsset::from_data_uri(color)?,
            EncodedAsset::from_data_uri(depth)?,
        ))
    }

    /// Parses a document produced by the builder (or saved to disk from one).
    pub fn from_html(html: String) -> Result<Self, AssetDecodeError> {
        let (color, depth) = Self::extract_assets(&html)?;
        Ok(Self { html, color, depth })
    }
}

fn find_slot_value(html: &str, slot: Slot) -> Option<&str> {
    let start = html.find(slot.anchor())? + slot.anchor().len();
    let len = html[start..].find('"')?;
    Some(&html[start..start + len])
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
