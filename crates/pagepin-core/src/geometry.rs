//! Pure geometry helpers: proportional fitting, scale transforms and clamped moves.

use crate::attachment::Attachment;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest extent a fitted size may collapse to.
pub const MIN_EXTENT: f64 = 1.0;

/// Geometry errors.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("Scale must be finite and positive, got {0}")]
    InvalidScale(f64),
}

/// Visual scale factor between canonical document units and on-screen units.
///
/// Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Scale(f64);

impl Scale {
    /// One canonical unit per visual unit.
    pub const IDENTITY: Scale = Scale(1.0);

    /// Create a scale, rejecting zero, negative and non-finite factors.
    pub fn new(factor: f64) -> Result<Self, GeometryError> {
        if factor.is_finite() && factor > 0.0 {
            Ok(Self(factor))
        } else {
            Err(GeometryError::InvalidScale(factor))
        }
    }

    /// The raw factor.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Canonical value to visual value.
    pub fn apply(self, value: f64) -> f64 {
        value * self.0
    }

    /// Visual value to canonical value.
    pub fn remove(self, value: f64) -> f64 {
        value / self.0
    }

    /// Visual pointer delta to canonical delta.
    pub fn remove_vec(self, delta: Vec2) -> Vec2 {
        Vec2::new(self.remove(delta.x), self.remove(delta.y))
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<f64> for Scale {
    type Error = GeometryError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Scale> for f64 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

/// Bound used by [`scale_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitBound {
    /// Shrink so the larger dimension is at most this value. Never upscales.
    Max(f64),
    /// Fit fully inside a box, scaling up or down.
    Box(Size),
}

/// Replace a degenerate extent (zero, negative, NaN, infinite) with [`MIN_EXTENT`].
pub fn sanitize_extent(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("Degenerate extent {} clamped to {}", value, MIN_EXTENT);
        MIN_EXTENT
    }
}

/// Proportionally resize `size` against `bound`, preserving aspect ratio.
pub fn scale_to(size: Size, bound: FitBound) -> Size {
    let width = sanitize_extent(size.width);
    let height = sanitize_extent(size.height);

    let factor = match bound {
        FitBound::Max(max) => {
            let max = sanitize_extent(max);
            let larger = width.max(height);
            if larger <= max { 1.0 } else { max / larger }
        }
        FitBound::Box(bounds) => {
            let box_width = sanitize_extent(bounds.width);
            let box_height = sanitize_extent(bounds.height);
            // The binding dimension is the one yielding the smaller factor
            (box_width / width).min(box_height / height)
        }
    };

    Size::new(
        (width * factor).max(f64::MIN_POSITIVE),
        (height * factor).max(f64::MIN_POSITIVE),
    )
}

/// Resolve the top-left of a box of `size` moved by `delta`, keeping it inside `bounds`.
///
/// An overflowing edge pins the box flush to that edge. A box larger than the
/// bounds on an axis is pinned to 0 on that axis.
pub fn clamped_move(origin: Point, delta: Vec2, size: Size, bounds: Size) -> Point {
    Point::new(
        clamp_axis(origin.x, delta.x, size.width, bounds.width),
        clamp_axis(origin.y, delta.y, size.height, bounds.height),
    )
}

fn clamp_axis(start: f64, delta: f64, extent: f64, bound: f64) -> f64 {
    if extent.is_nan() || bound.is_nan() || extent >= bound {
        return 0.0;
    }
    let max = bound - extent;
    let moved = start + delta;
    if moved.is_finite() {
        moved.clamp(0.0, max)
    } else {
        start.clamp(0.0, max)
    }
}

/// Project a canonical attachment into visual units.
pub fn to_visual(attachment: &Attachment, scale: Scale) -> Attachment {
    attachment.to_visual(scale)
}

/// Project a visual attachment back into canonical units.
pub fn to_canonical(attachment: &Attachment, scale: Scale) -> Attachment {
    attachment.to_canonical(scale)
}
