//! Viewer document template with named substitution slots.
//!
//! The template source is split into literal and slot segments once, at parse
//! time. Rendering walks the segments a single time, so bound values are never
//! rescanned and asset data can not collide with marker text.

use crate::error::TemplateError;

/// Markup, shaders and engine script for the browser host.
pub const VIEWER_TEMPLATE_SRC: &str = include_str!("../assets/viewer.html");

/// The two substitution points of the viewer document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Data URI of the color asset.
    ColorUrl,
    /// Data URI of the depth asset.
    DepthUrl,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::ColorUrl, Slot::DepthUrl];

    /// Marker text standing in for the slot in template source.
    pub const fn marker(self) -> &'static str {
        match self {
            Slot::ColorUrl => "{{{image_url_marker}}}",
            Slot::DepthUrl => "{{{depth_url_marker}}}",
        }
    }

    /// Script text immediately preceding the slot in the viewer template.
    /// Used to find bound values again in a rendered document.
    pub const fn anchor(self) -> &'static str {
        match self {
            Slot::ColorUrl => "const imageUrl = \"",
            Slot::DepthUrl => "const depthUrl = \"",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Slot::ColorUrl => "color-url",
            Slot::DepthUrl => "depth-url",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// A parsed template. Every slot in [`Slot::ALL`] appears exactly once.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
    literal_len: usize,
}

/// Values for a single render. All slots must be bound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotBindings<'a> {
    color_url: Option<&'a str>,
    depth_url: Option<&'a str>,
}

impl<'a> SlotBindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, slot: Slot, value: &'a str) -> Self {
        match slot {
            Slot::ColorUrl => self.color_url = Some(value),
            Slot::DepthUrl => self.depth_url = Some(value),
        }
        self
    }

    fn get(&self, slot: Slot) -> Option<&'a str> {
        match slot {
            Slot::ColorUrl => self.color_url,
            Slot::DepthUrl => self.depth_url,
        }
    }
}

impl Template {
    /// Splits `src` at slot markers.
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut seen = [false; Slot::ALL.len()];
        let mut rest = src;

        loop {
            let next = Slot::ALL
                .iter()
                .filter_map(|&slot| rest.find(slot.marker()).map(|at| (at, slot)))
                .min_by_key(|&(at, _)| at);

            let Some((at, slot)) = next else {
                if !rest.is_empty() {
                    segments.push(Segment::Literal(rest.to_string()));
                }
                break;
            };

            let idx = slot as usize;
            if seen[idx] {
                return Err(TemplateError::DuplicateSlot(slot));
            }
            seen[idx] = true;

            if at > 0 {
                segments.push(Segment::Literal(rest[..at].to_string()));
            }
            segments.push(Segment::Slot(slot));
            rest = &rest[at + slot.marker().len()..];
        }

        if let Some(missing) = Slot::ALL.iter().find(|&&s| !seen[s as usize]) {
            return Err(TemplateError::MissingSlot(*missing));
        }

        let literal_len = segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Slot(_) => 0,
            })
            .sum();

        Ok(Self {
            segments,
            literal_len,
        })
    }

    /// The built-in viewer template.
    pub fn viewer() -> Result<Template, TemplateError> {
        Template::parse(VIEWER_TEMPLATE_SRC)
    }

    /// Produces the final text. Fails if any slot is unbound.
    pub fn render(&self, bindings: &SlotBindings<'_>) -> Result<String, TemplateError> {
        let mut values = [""; Slot::ALL.len()];
        for slot in Slot::ALL {
            values[slot as usize] = bindings.get(slot).ok_or(TemplateError::UnboundSlot(slot))?;
        }

        let bound_len: usize = values.iter().map(|v| v.len()).sum();
        let mut out = String::with_capacity(self.literal_len + bound_len);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => out.push_str(values[*slot as usize]),
            }
        }

        Ok(out)
    }
}
