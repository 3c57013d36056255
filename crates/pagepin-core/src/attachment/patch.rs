//! Explicit update patches for attachments.

use crate::placement::PlacementId;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// What to do with an attachment's slot membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotChange {
    /// Leave `column_id` as it is.
    #[default]
    Keep,
    /// Snap into the given placement.
    Snap(PlacementId),
    /// Explicitly clear `column_id`.
    Release,
}

/// Position and size update, valid for every attachment variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryPatch {
    /// New top-left in canonical units.
    #[serde(default)]
    pub position: Option<Point>,
    /// New extent in canonical units.
    #[serde(default)]
    pub size: Option<Size>,
    /// Slot membership change.
    #[serde(default)]
    pub slot: SlotChange,
}

impl GeometryPatch {
    /// Move only, keeping size and slot.
    pub fn moved_to(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Committed text content, valid only for text attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextContentPatch {
    pub text: String,
    pub lines: Vec<String>,
}

/// A typed partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentPatch {
    Geometry(GeometryPatch),
    TextContent(TextContentPatch),
}

impl From<GeometryPatch> for AttachmentPatch {
    fn from(patch: GeometryPatch) -> Self {
        AttachmentPatch::Geometry(patch)
    }
}

impl From<TextContentPatch> for AttachmentPatch {
    fn from(patch: TextContentPatch) -> Self {
        AttachmentPatch::TextContent(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_patch_rejects_unknown_fields() {
        let json = r#"{"kind":"geometry","position":{"x":1.0,"y":2.0},"colour":"red"}"#;
        assert!(serde_json::from_str::<AttachmentPatch>(json).is_err());
    }

    #[test]
    fn test_geometry_patch_defaults() {
        let json = r#"{"kind":"geometry","position":{"x":1.0,"y":2.0}}"#;
        let patch: AttachmentPatch = serde_json::from_str(json).unwrap();
        match patch {
            AttachmentPatch::Geometry(g) => {
                assert_eq!(g.position, Some(Point::new(1.0, 2.0)));
                assert_eq!(g.size, None);
                assert_eq!(g.slot, SlotChange::Keep);
            }
            other => panic!("unexpected patch {:?}", other),
        }
    }

    #[test]
    fn test_text_patch_parses() {
        let json = r#"{"kind":"text_content","text":"hi","lines":["hi"]}"#;
        let patch: AttachmentPatch = serde_json::from_str(json).unwrap();
        assert_eq!(
            patch,
            AttachmentPatch::TextContent(TextContentPatch {
                text: "hi".to_string(),
                lines: vec!["hi".to_string()],
            })
        );
    }
}
