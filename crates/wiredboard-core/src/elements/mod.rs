//! Board elements: notes and images.

mod image;

pub use image::{ImageFormat, data_uri, parse_data_uri};

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Height/width ratio assumed for an image whose height is not known yet.
pub const AUTO_HEIGHT_RATIO: f64 = 0.75;

/// Element height: a concrete value or derived from the width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HeightRepr", into = "HeightRepr")]
pub enum Height {
    Fixed(f64),
    /// Not measured yet; approximated as `width * AUTO_HEIGHT_RATIO`.
    Auto,
}

impl Height {
    /// Resolve to a concrete height for an element of the given width.
    pub fn resolve(self, width: f64) -> f64 {
        match self {
            Height::Fixed(h) => h,
            Height::Auto => width * AUTO_HEIGHT_RATIO,
        }
    }
}

/// Wire form of [`Height`]: a number or the string `"auto"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HeightRepr {
    Value(f64),
    Keyword(String),
}

impl TryFrom<HeightRepr> for Height {
    type Error = String;

    fn try_from(repr: HeightRepr) -> Result<Self, Self::Error> {
        match repr {
            HeightRepr::Value(h) => Ok(Height::Fixed(h)),
            HeightRepr::Keyword(k) if k == "auto" => Ok(Height::Auto),
            HeightRepr::Keyword(k) => Err(format!("invalid height: {k}")),
        }
    }
}

impl From<Height> for HeightRepr {
    fn from(height: Height) -> Self {
        match height {
            Height::Fixed(h) => HeightRepr::Value(h),
            Height::Auto => HeightRepr::Keyword("auto".to_string()),
        }
    }
}

/// Kind-specific payload of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A text note.
    Note { text: String },
    /// An image; `content` is a data URI.
    Image { content: String },
}

impl ElementKind {
    pub fn note(text: impl Into<String>) -> Self {
        ElementKind::Note { text: text.into() }
    }

    pub fn image(content: impl Into<String>) -> Self {
        ElementKind::Image { content: content.into() }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, ElementKind::Note { .. })
    }

    /// Short name used in the session record and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Note { .. } => "note",
            ElementKind::Image { .. } => "image",
        }
    }
}

/// A board element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) id: ElementId,
    /// Top-left corner in board space.
    pub position: Point,
    pub width: f64,
    pub height: Height,
    /// Highlighted as the pending link source.
    pub is_linking: bool,
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(kind: ElementKind, position: Point, width: f64, height: Height) -> Self {
        Self::with_id(Uuid::new_v4(), kind, position, width, height)
    }

    /// Create an element with a known id (used when restoring sessions).
    pub fn with_id(id: ElementId, kind: ElementKind, position: Point, width: f64, height: Height) -> Self {
        Self {
            id,
            position,
            width,
            height,
            is_linking: false,
            kind,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Height used for geometry (auto heights are approximated).
    pub fn effective_height(&self) -> f64 {
        self.height.resolve(self.width)
    }

    /// Bounding rectangle in board space.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.effective_height()))
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Note text, if this is a note.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Note { text } => Some(text),
            ElementKind::Image { .. } => None,
        }
    }

    /// Image content, if this is an image.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Image { content } => Some(content),
            ElementKind::Note { .. } => None,
        }
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Grow or shrink by `delta`, respecting the floors. Images keep their height.
    pub(crate) fn resize(&mut self, delta: Vec2, limits: ResizeLimits) {
        let old_width = self.width;
        self.width = (self.width + delta.x).max(limits.min_width);
        if self.kind.is_note() {
            let current = self.height.resolve(old_width);
            self.height = Height::Fixed((current + delta.y).max(limits.min_height));
        }
    }

    /// Which part of the element, if any, is under `point`.
    pub fn region_at(&self, point: Point, layout: ElementLayout) -> Option<HitRegion> {
        let bounds = self.bounds();
        if !bounds.contains(point) {
            return None;
        }
        if layout.resize_handle(bounds).contains(point) {
            return Some(HitRegion::ResizeHandle);
        }
        if self.kind.is_note() && layout.text_input(bounds).contains(point) {
            return Some(HitRegion::TextInput);
        }
        Some(HitRegion::Body)
    }
}

/// Lower bounds applied while resizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self {
            min_width: 80.0,
            min_height: 60.0,
        }
    }
}

/// Sizes of the interactive parts drawn inside each element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementLayout {
    /// Button strip along the bottom edge.
    pub footer_height: f64,
    /// Square resize handle in the bottom-right corner.
    pub handle_size: f64,
}

impl Default for ElementLayout {
    fn default() -> Self {
        Self {
            footer_height: 25.0,
            handle_size: 10.0,
        }
    }
}

impl ElementLayout {
    pub fn resize_handle(&self, bounds: Rect) -> Rect {
        Rect::new(
            bounds.x1 - self.handle_size,
            bounds.y1 - self.handle_size,
            bounds.x1,
            bounds.y1,
        )
    }

    pub fn footer(&self, bounds: Rect) -> Rect {
        let top = (bounds.y1 - self.footer_height).max(bounds.y0);
        Rect::new(bounds.x0, top, bounds.x1, bounds.y1)
    }

    /// Note text area: everything above the footer.
    pub fn text_input(&self, bounds: Rect) -> Rect {
        Rect::new(bounds.x0, bounds.y0, bounds.x1, self.footer(bounds).y0)
    }
}

/// Part of an element hit by the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitRegion {
    /// Starts a resize drag.
    ResizeHandle,
    /// Editable text; pointer presses go to the text input, not a drag.
    TextInput,
    /// Anywhere else on the element; starts a move drag.
    Body,
}
