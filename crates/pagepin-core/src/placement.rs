//! Predefined slot regions and drop resolution.
//!
//! A drop either lands over one or more registered placements (a slot snap)
//! or nowhere in particular (a free move clamped to the page).

use crate::attachment::{Attachment, GeometryPatch, SlotChange};
use crate::geometry::{FitBound, Scale, clamped_move, scale_to};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Identifier of a placement slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementId(String);

impl PlacementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlacementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A predefined drop target region on a page, in canonical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: PlacementId,
    #[serde(flatten)]
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn new(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: PlacementId::new(id),
            position: Point::new(x, y),
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    /// Check if a canonical point lies inside this slot.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }
}

/// Placement resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("Placement id registered more than once: {0}")]
    DuplicatePlacement(PlacementId),
    #[error("Drop target is not a registered placement: {0}")]
    UnknownPlacement(PlacementId),
}

/// Outcome of resolving a drop.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Snapped into a slot; geometry is canonical.
    Snapped {
        placement: PlacementId,
        position: Point,
        size: Size,
    },
    /// Free-form move; the attachment leaves any slot it was in.
    Moved { position: Point },
}

impl Resolution {
    /// The patch that commits this resolution.
    pub fn to_patch(&self) -> GeometryPatch {
        match self {
            Resolution::Snapped {
                placement,
                position,
                size,
            } => GeometryPatch {
                position: Some(*position),
                size: Some(*size),
                slot: SlotChange::Snap(placement.clone()),
            },
            Resolution::Moved { position } => GeometryPatch {
                position: Some(*position),
                size: None,
                slot: SlotChange::Release,
            },
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Resolution::Snapped { position, .. } | Resolution::Moved { position } => *position,
        }
    }

    /// Slot the attachment ends up in.
    pub fn column_id(&self) -> Option<&PlacementId> {
        match self {
            Resolution::Snapped { placement, .. } => Some(placement),
            Resolution::Moved { .. } => None,
        }
    }
}

/// Resolves drops against one page's placements.
#[derive(Debug, Clone, Copy)]
pub struct PlacementResolver<'a> {
    placements: &'a [Placement],
    page_size: Size,
}

impl<'a> PlacementResolver<'a> {
    /// Create a resolver, rejecting duplicate placement ids.
    pub fn new(placements: &'a [Placement], page_size: Size) -> Result<Self, PlacementError> {
        let mut seen = HashSet::with_capacity(placements.len());
        for placement in placements {
            if !seen.insert(&placement.id) {
                return Err(PlacementError::DuplicatePlacement(placement.id.clone()));
            }
        }
        Ok(Self {
            placements,
            page_size,
        })
    }

    pub fn placements(&self) -> &'a [Placement] {
        self.placements
    }

    /// Ids of the slots containing a canonical point, in defined order.
    pub fn placements_under(&self, point: Point) -> Vec<PlacementId> {
        self.placements
            .iter()
            .filter(|p| p.contains(point))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Pick the winning slot among the reported `over` ids.
    ///
    /// Every reported id must be registered. When several are reported the one
    /// that comes first in the placement list wins.
    pub fn target(&self, over: &[PlacementId]) -> Result<Option<&'a Placement>, PlacementError> {
        let mut best: Option<(usize, &'a Placement)> = None;
        for id in over {
            let (index, placement) = self
                .placements
                .iter()
                .enumerate()
                .find(|(_, p)| &p.id == id)
                .ok_or_else(|| PlacementError::UnknownPlacement(id.clone()))?;
            if best.is_none_or(|(best_index, _)| index < best_index) {
                best = Some((index, placement));
            }
        }
        Ok(best.map(|(_, placement)| placement))
    }

    /// Resolve a drop of `attachment` (canonical, pre-drag) moved by a visual `delta`.
    pub fn resolve(
        &self,
        attachment: &Attachment,
        delta: Vec2,
        over: &[PlacementId],
        scale: Scale,
    ) -> Result<Resolution, PlacementError> {
        match self.target(over)? {
            Some(placement) => Ok(self.snap(attachment, placement, scale)),
            None => {
                let position = clamped_move(
                    attachment.position(),
                    scale.remove_vec(delta),
                    attachment.size(),
                    self.page_size,
                );
                log::debug!("Attachment {} moved freely to {:?}", attachment.id(), position);
                Ok(Resolution::Moved { position })
            }
        }
    }

    fn snap(&self, attachment: &Attachment, placement: &Placement, scale: Scale) -> Resolution {
        let fitted = scale_to(attachment.aspect_source(), FitBound::Box(placement.size()));

        // Rendered geometry, then back to canonical for storage
        let visual_size = Size::new(scale.apply(fitted.width), scale.apply(fitted.height));
        let visual_origin = Point::new(scale.apply(placement.position.x), scale.apply(placement.position.y));
        let size = Size::new(scale.remove(visual_size.width), scale.remove(visual_size.height));
        let position = Point::new(scale.remove(visual_origin.x), scale.remove(visual_origin.y));

        log::debug!(
            "Attachment {} snapped into {} at {:?} size {:?}",
            attachment.id(),
            placement.id,
            position,
            size
        );
        Resolution::Snapped {
            placement: placement.id.clone(),
            position,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentId, ImageAttachment, ImageSource, TextAttachment};

    const PAGE: Size = Size::new(600.0, 800.0);

    fn text_at(x: f64, y: f64) -> Attachment {
        TextAttachment::new(AttachmentId::new("t1"), Point::new(x, y), "Hello")
            .with_size(120.0, 25.0)
            .into()
    }

    fn image() -> Attachment {
        ImageAttachment::new(
            AttachmentId::new("i1"),
            Point::new(10.0, 10.0),
            ImageSource::Url("a.png".into()),
            200,
            100,
        )
        .into()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_free_move() {
        let resolver = PlacementResolver::new(&[], PAGE).unwrap();
        let resolution = resolver
            .resolve(&text_at(100.0, 100.0), Vec2::new(50.0, 50.0), &[], Scale::IDENTITY)
            .unwrap();
        assert_eq!(resolution, Resolution::Moved { position: Point::new(150.0, 150.0) });
        assert_eq!(resolution.to_patch().slot, SlotChange::Release);
        assert!(resolution.column_id().is_none());
    }

    #[test]
    fn test_free_move_delta_is_visual() {
        let resolver = PlacementResolver::new(&[], PAGE).unwrap();
        let scale = Scale::new(2.0).unwrap();
        let resolution = resolver
            .resolve(&text_at(100.0, 100.0), Vec2::new(50.0, 50.0), &[], scale)
            .unwrap();
        assert_eq!(resolution.position(), Point::new(125.0, 125.0));
    }

    #[test]
    fn test_edge_clamp() {
        let resolver = PlacementResolver::new(&[], PAGE).unwrap();
        let resolution = resolver
            .resolve(&text_at(100.0, 100.0), Vec2::new(-200.0, -200.0), &[], Scale::IDENTITY)
            .unwrap();
        assert_eq!(resolution.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_slot_snap_is_scale_independent() {
        let placements = [Placement::new("p1", 200.0, 200.0, 80.0, 40.0)];
        let resolver = PlacementResolver::new(&placements, PAGE).unwrap();
        let over = [PlacementId::new("p1")];

        for factor in [0.5, 1.0, 1.5, 1.65, 3.0] {
            let scale = Scale::new(factor).unwrap();
            let resolution = resolver.resolve(&image(), Vec2::ZERO, &over, scale).unwrap();
            match resolution {
                Resolution::Snapped { placement, position, size } => {
                    assert_eq!(placement, PlacementId::new("p1"));
                    assert!(approx(position.x, 200.0) && approx(position.y, 200.0));
                    assert!(approx(size.width, 80.0) && approx(size.height, 40.0));
                }
                other => panic!("expected snap, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_snap_preserves_own_aspect_ratio() {
        let placements = [Placement::new("p1", 0.0, 0.0, 80.0, 80.0)];
        let resolver = PlacementResolver::new(&placements, PAGE).unwrap();
        let resolution = resolver
            .resolve(&image(), Vec2::ZERO, &[PlacementId::new("p1")], Scale::IDENTITY)
            .unwrap();
        let patch = resolution.to_patch();
        let size = patch.size.unwrap();
        assert!(approx(size.width, 80.0));
        assert!(approx(size.height, 40.0));
    }

    #[test]
    fn test_overlapping_placements_first_defined_wins() {
        let placements = [
            Placement::new("a", 0.0, 0.0, 100.0, 100.0),
            Placement::new("b", 50.0, 50.0, 100.0, 100.0),
        ];
        let resolver = PlacementResolver::new(&placements, PAGE).unwrap();
        let reported = [PlacementId::new("b"), PlacementId::new("a")];

        for _ in 0..10 {
            let resolution = resolver
                .resolve(&text_at(0.0, 0.0), Vec2::ZERO, &reported, Scale::IDENTITY)
                .unwrap();
            assert_eq!(resolution.column_id(), Some(&PlacementId::new("a")));
        }
    }

    #[test]
    fn test_placements_under_in_defined_order() {
        let placements = [
            Placement::new("a", 0.0, 0.0, 100.0, 100.0),
            Placement::new("b", 50.0, 50.0, 100.0, 100.0),
        ];
        let resolver = PlacementResolver::new(&placements, PAGE).unwrap();
        assert_eq!(
            resolver.placements_under(Point::new(75.0, 75.0)),
            vec![PlacementId::new("a"), PlacementId::new("b")]
        );
        assert!(resolver.placements_under(Point::new(500.0, 500.0)).is_empty());
    }

    #[test]
    fn test_unknown_target_fails() {
        let placements = [Placement::new("p1", 200.0, 200.0, 80.0, 40.0)];
        let resolver = PlacementResolver::new(&placements, PAGE).unwrap();
        let err = resolver
            .resolve(&image(), Vec2::ZERO, &[PlacementId::new("missing")], Scale::IDENTITY)
            .unwrap_err();
        assert_eq!(err, PlacementError::UnknownPlacement(PlacementId::new("missing")));
    }

    #[test]
    fn test_duplicate_placements_rejected() {
        let placements = [
            Placement::new("p1", 0.0, 0.0, 10.0, 10.0),
            Placement::new("p1", 20.0, 20.0, 10.0, 10.0),
        ];
        let err = PlacementResolver::new(&placements, PAGE).unwrap_err();
        assert_eq!(err, PlacementError::DuplicatePlacement(PlacementId::new("p1")));
    }
}
