//! Drag gesture events and per-gesture state.

use crate::attachment::{Attachment, AttachmentId};
use crate::geometry::Scale;
use crate::placement::PlacementId;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A pointer position together with the window scroll offset at that moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// Pointer position in client (viewport) coordinates.
    pub pointer: Point,
    /// Window scroll offset.
    #[serde(default)]
    pub scroll: Vec2,
}

impl PointerSample {
    pub fn new(pointer: Point, scroll: Vec2) -> Self {
        Self { pointer, scroll }
    }

    /// Sample with no scroll offset.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(Point::new(x, y), Vec2::ZERO)
    }

    /// Position in scroll-independent document space.
    pub fn anchor(&self) -> Point {
        self.pointer + self.scroll
    }
}

/// Typed drag events consumed by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    /// Pointer went down on an attachment.
    Start { id: AttachmentId, at: PointerSample },
    /// Pointer moved.
    Move { at: PointerSample },
    /// Pointer released, optionally over one or more placements.
    Drop {
        at: PointerSample,
        #[serde(default)]
        over: Vec<PlacementId>,
    },
    /// Gesture aborted (escape key, lost capture).
    Cancel,
}

/// Render-only copy of the dragged attachment that follows the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    /// The attachment in visual units at its pre-drag position.
    pub attachment: Attachment,
    /// Visual offset from the pre-drag position.
    pub offset: Vec2,
}

impl OverlaySnapshot {
    pub fn new(canonical: &Attachment, scale: Scale) -> Self {
        Self {
            attachment: canonical.to_visual(scale),
            offset: Vec2::ZERO,
        }
    }

    /// Where the overlay is drawn, in visual units.
    pub fn visual_bounds(&self) -> Rect {
        self.attachment.bounds() + self.offset
    }
}

/// Pointer went down but has not travelled far enough to count as a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDrag {
    pub attachment_id: AttachmentId,
    pub page_index: usize,
    pub origin: PointerSample,
}

/// An open drag session.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub attachment_id: AttachmentId,
    pub page_index: usize,
    /// Document-space anchor captured at gesture start.
    pub origin: Point,
    /// Latest document-space pointer position.
    pub current: Point,
    /// Canonical attachment as it was before the drag.
    pub original: Attachment,
    pub overlay: OverlaySnapshot,
}

impl DragSession {
    /// Accumulated visual delta.
    pub fn delta(&self) -> Vec2 {
        self.current - self.origin
    }

    pub(crate) fn track(&mut self, sample: PointerSample) {
        self.current = sample.anchor();
        self.overlay.offset = self.delta();
    }
}

/// Drag state machine phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    Pending(PendingDrag),
    Dragging(DragSession),
}

impl DragPhase {
    /// Id of the attachment under an active or pending gesture.
    pub fn attachment_id(&self) -> Option<&AttachmentId> {
        match self {
            DragPhase::Idle => None,
            DragPhase::Pending(p) => Some(&p.attachment_id),
            DragPhase::Dragging(s) => Some(&s.attachment_id),
        }
    }

    /// Page the current gesture belongs to.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            DragPhase::Idle => None,
            DragPhase::Pending(p) => Some(p.page_index),
            DragPhase::Dragging(s) => Some(s.page_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::TextAttachment;

    #[test]
    fn test_anchor_includes_scroll() {
        let sample = PointerSample::new(Point::new(10.0, 20.0), Vec2::new(0.0, 300.0));
        assert_eq!(sample.anchor(), Point::new(10.0, 320.0));
    }

    #[test]
    fn test_overlay_follows_pointer() {
        let text: Attachment = TextAttachment::new(AttachmentId::new("t"), Point::new(10.0, 10.0), "x").into();
        let scale = Scale::new(2.0).unwrap();
        let mut session = DragSession {
            attachment_id: AttachmentId::new("t"),
            page_index: 0,
            origin: Point::new(100.0, 100.0),
            current: Point::new(100.0, 100.0),
            original: text.clone(),
            overlay: OverlaySnapshot::new(&text, scale),
        };
        session.track(PointerSample::at(130.0, 90.0));
        assert_eq!(session.delta(), Vec2::new(30.0, -10.0));
        let bounds = session.overlay.visual_bounds();
        assert_eq!(bounds.origin(), Point::new(50.0, 10.0));
        // The session copy stays canonical
        assert_eq!(session.original.position(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{"event":"drop","at":{"pointer":{"x":1.0,"y":2.0}},"over":["p1"]}"#;
        let event: DragEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            DragEvent::Drop {
                at: PointerSample::at(1.0, 2.0),
                over: vec![PlacementId::new("p1")],
            }
        );
    }
}
