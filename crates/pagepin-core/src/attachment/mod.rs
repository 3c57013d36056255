//! Attachment definitions: free-text labels and images overlaid on a page.

mod image;
mod patch;
mod text;

pub use image::{ImageAttachment, ImageFormat, ImageSource};
pub use patch::{AttachmentPatch, GeometryPatch, SlotChange, TextContentPatch};
pub use text::{FontFamily, TextAttachment, wrap_lines};

use crate::geometry::Scale;
use crate::placement::PlacementId;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, stable identifier for an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttachmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Attachment discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Text,
    Image,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Text => f.write_str("text"),
            AttachmentKind::Image => f.write_str("image"),
        }
    }
}

/// Behaviour shared by every attachment variant.
pub trait AttachmentTrait {
    /// Get the unique identifier.
    fn id(&self) -> &AttachmentId;

    /// Top-left corner.
    fn position(&self) -> Point;

    /// Width and height.
    fn size(&self) -> Size;

    /// Slot the attachment is snapped into.
    fn column_id(&self) -> Option<&PlacementId>;

    /// Bounding box.
    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }

    /// Check if a point hits this attachment.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    /// Size whose aspect ratio is preserved when fitting into a slot.
    fn aspect_source(&self) -> Size {
        self.size()
    }

    /// Merge a geometry patch.
    fn apply_geometry(&mut self, patch: &GeometryPatch);

    /// Apply `map` to every unit-carrying field.
    fn map_units(&mut self, map: &dyn Fn(f64) -> f64);
}

/// A text or image attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Text(TextAttachment),
    Image(ImageAttachment),
}

impl Attachment {
    pub fn id(&self) -> &AttachmentId {
        match self {
            Attachment::Text(a) => a.id(),
            Attachment::Image(a) => a.id(),
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        match self {
            Attachment::Text(_) => AttachmentKind::Text,
            Attachment::Image(_) => AttachmentKind::Image,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Attachment::Text(a) => a.position(),
            Attachment::Image(a) => a.position(),
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Attachment::Text(a) => a.size(),
            Attachment::Image(a) => a.size(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Attachment::Text(a) => a.bounds(),
            Attachment::Image(a) => a.bounds(),
        }
    }

    pub fn column_id(&self) -> Option<&PlacementId> {
        match self {
            Attachment::Text(a) => a.column_id(),
            Attachment::Image(a) => a.column_id(),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Attachment::Text(a) => a.hit_test(point, tolerance),
            Attachment::Image(a) => a.hit_test(point, tolerance),
        }
    }

    pub fn aspect_source(&self) -> Size {
        match self {
            Attachment::Text(a) => a.aspect_source(),
            Attachment::Image(a) => a.aspect_source(),
        }
    }

    /// Apply a typed patch. Returns `false` when the patch does not fit this variant.
    #[must_use]
    pub fn apply(&mut self, patch: &AttachmentPatch) -> bool {
        match (self, patch) {
            (Attachment::Text(a), AttachmentPatch::Geometry(g)) => a.apply_geometry(g),
            (Attachment::Image(a), AttachmentPatch::Geometry(g)) => a.apply_geometry(g),
            (Attachment::Text(a), AttachmentPatch::TextContent(t)) => a.apply_content(t),
            (Attachment::Image(_), AttachmentPatch::TextContent(_)) => return false,
        }
        true
    }

    fn map_units(&mut self, map: &dyn Fn(f64) -> f64) {
        match self {
            Attachment::Text(a) => a.map_units(map),
            Attachment::Image(a) => a.map_units(map),
        }
    }

    /// Copy with every unit-carrying field multiplied by `scale`.
    pub fn to_visual(&self, scale: Scale) -> Self {
        let mut visual = self.clone();
        visual.map_units(&|v| scale.apply(v));
        visual
    }

    /// Copy with every unit-carrying field divided by `scale`.
    pub fn to_canonical(&self, scale: Scale) -> Self {
        let mut canonical = self.clone();
        canonical.map_units(&|v| scale.remove(v));
        canonical
    }

    pub fn as_text(&self) -> Option<&TextAttachment> {
        match self {
            Attachment::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageAttachment> {
        match self {
            Attachment::Image(i) => Some(i),
            _ => None,
        }
    }
}

impl From<TextAttachment> for Attachment {
    fn from(text: TextAttachment) -> Self {
        Attachment::Text(text)
    }
}

impl From<ImageAttachment> for Attachment {
    fn from(image: ImageAttachment) -> Self {
        Attachment::Image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_text() -> Attachment {
        TextAttachment::new(AttachmentId::new("t1"), Point::new(100.0, 100.0), "Hello").into()
    }

    fn sample_image() -> Attachment {
        ImageAttachment::new(
            AttachmentId::new("i1"),
            Point::new(10.0, 20.0),
            ImageSource::Url("a.png".into()),
            200,
            100,
        )
        .with_size(80.0, 40.0)
        .into()
    }

    #[test]
    fn test_serde_tagged_by_type() {
        let json = serde_json::to_value(sample_text()).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["x"], 100.0);
        assert_eq!(json["size"], 16.0);
        assert!(json.get("column_id").is_none());

        let back: Attachment = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample_text());

        let json = serde_json::to_value(sample_image()).unwrap();
        assert_eq!(json["type"], "image");
        let back: Attachment = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample_image());
    }

    #[test]
    fn test_to_visual_scales_font_size() {
        let scale = Scale::new(2.0).unwrap();
        let visual = sample_text().to_visual(scale);
        let text = visual.as_text().unwrap();
        assert!((text.font_size - 32.0).abs() < 1e-9);
        assert!((text.line_height - TextAttachment::DEFAULT_LINE_HEIGHT).abs() < 1e-9);
        assert_eq!(visual.position(), Point::new(200.0, 200.0));
        assert_eq!(visual.size(), Size::new(240.0, 50.0));
    }

    #[test]
    fn test_to_visual_keeps_natural_size() {
        let scale = Scale::new(1.5).unwrap();
        let visual = sample_image().to_visual(scale);
        let image = visual.as_image().unwrap();
        assert_eq!(image.natural_width, 200);
        assert!((image.width - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_patch_rejected_for_image() {
        let mut image = sample_image();
        let before = image.clone();
        let applied = image.apply(&AttachmentPatch::TextContent(TextContentPatch::default()));
        assert!(!applied);
        assert_eq!(image, before);
    }

    #[test]
    fn test_hit_test() {
        let text = sample_text();
        assert!(text.hit_test(Point::new(150.0, 110.0), 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
        assert!(text.hit_test(Point::new(98.0, 98.0), 3.0));
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(1.0)
    }

    proptest! {
        #[test]
        fn prop_scale_roundtrip(
            x in -1000.0f64..5000.0,
            y in -1000.0f64..5000.0,
            w in 0.1f64..2000.0,
            h in 0.1f64..2000.0,
            font in 1.0f64..200.0,
            factor in 0.01f64..20.0,
        ) {
            let scale = Scale::new(factor).unwrap();
            let original: Attachment = TextAttachment::new(AttachmentId::new("p"), Point::new(x, y), "x")
                .with_size(w, h)
                .with_font_size(font)
                .into();
            let back = original.to_visual(scale).to_canonical(scale);
            let (a, b) = (original.as_text().unwrap(), back.as_text().unwrap());
            prop_assert!(close(a.position.x, b.position.x));
            prop_assert!(close(a.position.y, b.position.y));
            prop_assert!(close(a.width, b.width));
            prop_assert!(close(a.height, b.height));
            prop_assert!(close(a.font_size, b.font_size));
            prop_assert_eq!(&a.text, &b.text);
            prop_assert_eq!(&a.lines, &b.lines);
        }
    }
}
