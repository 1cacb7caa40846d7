//! Stored session format and conversion to and from board types.
//!
//! ```json
//! { "elements": [ { "id": "...", "kind": "note", "x": 0, "y": 0,
//!                   "width": 160, "height": 100, "text": "" } ],
//!   "links": [ { "from": "...", "to": "..." } ],
//!   "viewport": { "scale": 1, "offsetX": 0, "offsetY": 0 },
//!   "linkColor": "#00FFFF" }
//! ```

use crate::board::Link;
use crate::color::LinkColor;
use crate::elements::{Element, ElementId, ElementKind, Height};
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

const KIND_NOTE: &str = "note";
const KIND_IMAGE: &str = "image";

/// Top-level stored record. Missing fields fall back to an empty board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub viewport: ViewportRecord,
    #[serde(default)]
    pub link_color: LinkColor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: ElementId,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: Height,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRecord {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ViewportRecord {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl From<&Element> for ElementRecord {
    fn from(element: &Element) -> Self {
        let (text, content) = match &element.kind {
            ElementKind::Note { text } => (Some(text.clone()), None),
            ElementKind::Image { content } => (None, Some(content.clone())),
        };
        Self {
            id: element.id(),
            kind: element.kind.name().to_string(),
            x: element.position.x,
            y: element.position.y,
            width: element.width,
            height: element.height,
            text,
            content,
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl TryFrom<ElementRecord> for Element {
    type Error = String;

    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        if !record.x.is_finite() || !record.y.is_finite() {
            return Err(format!("element {} has a non-finite position", record.id));
        }
        if !positive(record.width) {
            return Err(format!("element {} has invalid width {}", record.id, record.width));
        }
        if let Height::Fixed(h) = record.height {
            if !positive(h) {
                return Err(format!("element {} has invalid height {}", record.id, h));
            }
        }
        let kind = match record.kind.as_str() {
            KIND_NOTE => ElementKind::Note {
                text: record.text.unwrap_or_default(),
            },
            KIND_IMAGE => ElementKind::Image {
                content: record
                    .content
                    .ok_or_else(|| format!("image {} has no content", record.id))?,
            },
            other => return Err(format!("element {} has unknown kind '{}'", record.id, other)),
        };
        Ok(Element::with_id(
            record.id,
            kind,
            Point::new(record.x, record.y),
            record.width,
            record.height,
        ))
    }
}

impl From<&Viewport> for ViewportRecord {
    fn from(viewport: &Viewport) -> Self {
        Self {
            scale: viewport.scale,
            offset_x: viewport.offset.x,
            offset_y: viewport.offset.y,
        }
    }
}

impl TryFrom<ViewportRecord> for Viewport {
    type Error = String;

    fn try_from(record: ViewportRecord) -> Result<Self, Self::Error> {
        if !positive(record.scale) || !record.offset_x.is_finite() || !record.offset_y.is_finite() {
            return Err(format!(
                "invalid viewport (scale {}, offset {}, {})",
                record.scale, record.offset_x, record.offset_y
            ));
        }
        Ok(Viewport::new(record.scale, Vec2::new(record.offset_x, record.offset_y)))
    }
}
