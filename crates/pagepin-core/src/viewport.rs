//! Viewport module for the zoom level of one document view.

use crate::geometry::{GeometryError, Scale};
use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

/// Scale a freshly opened view starts at.
pub const BASE_SCALE: f64 = 1.65;

/// Viewport holds the visual scale of a single view.
///
/// The engine never reads it implicitly: callers pass [`Viewport::scale`]
/// into every transform, so several views can run at different zoom levels.
///
/// Limits always satisfy `min_scale <= max_scale`; deserializing goes through
/// the same check as [`Viewport::with_limits`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ViewportRecord")]
pub struct Viewport {
    /// Current visual scale.
    scale: Scale,
    min_scale: Scale,
    max_scale: Scale,
}

#[derive(Deserialize)]
struct ViewportRecord {
    scale: f64,
    min_scale: f64,
    max_scale: f64,
}

impl TryFrom<ViewportRecord> for Viewport {
    type Error = GeometryError;

    fn try_from(record: ViewportRecord) -> Result<Self, Self::Error> {
        Viewport::with_limits(record.scale, record.min_scale, record.max_scale)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_limits(BASE_SCALE, 0.25, 5.0).unwrap_or(Self {
            scale: Scale::IDENTITY,
            min_scale: Scale::IDENTITY,
            max_scale: Scale::IDENTITY,
        })
    }
}

impl Viewport {
    /// Create a viewport with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with explicit limits and starting scale.
    pub fn with_limits(initial: f64, min_scale: f64, max_scale: f64) -> Result<Self, GeometryError> {
        let min = Scale::new(min_scale)?;
        let max = Scale::new(max_scale)?;
        let max = if max < min { min } else { max };
        let scale = Scale::new(initial.clamp(min.get(), max.get()))?;
        Ok(Self {
            scale,
            min_scale: min,
            max_scale: max,
        })
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn min_scale(&self) -> Scale {
        self.min_scale
    }

    pub fn max_scale(&self) -> Scale {
        self.max_scale
    }

    fn clamp(&self, factor: f64) -> f64 {
        factor.clamp(self.min_scale.get(), self.max_scale.get())
    }

    /// Set the scale, clamped to the limits.
    pub fn set_scale(&mut self, factor: f64) -> Result<Scale, GeometryError> {
        let requested = Scale::new(factor)?;
        self.scale = Scale::new(self.clamp(requested.get()))?;
        Ok(self.scale)
    }

    /// Multiply the scale by `factor`, clamped to the limits.
    pub fn zoom_by(&mut self, factor: f64) -> Result<Scale, GeometryError> {
        self.set_scale(self.scale.get() * factor)
    }

    /// Reset to the base scale.
    pub fn reset(&mut self) {
        let base = self.clamp(BASE_SCALE);
        self.scale = Scale::new(base).unwrap_or(Scale::IDENTITY);
    }

    /// Canonical to visual transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale.get())
    }

    /// Visual to canonical transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale.get())
    }

    pub fn to_visual_point(&self, point: Point) -> Point {
        Point::new(self.scale.apply(point.x), self.scale.apply(point.y))
    }

    pub fn to_canonical_point(&self, point: Point) -> Point {
        Point::new(self.scale.remove(point.x), self.scale.remove(point.y))
    }

    /// On-screen size of a page.
    pub fn visual_page_size(&self, page: Size) -> Size {
        Size::new(self.scale.apply(page.width), self.scale.apply(page.height))
    }

    /// Choose the scale at which `page` fills `available_width`.
    pub fn fit_page_width(&mut self, page: Size, available_width: f64) -> Result<Scale, GeometryError> {
        if page.width <= 0.0 || !page.width.is_finite() {
            self.reset();
            return Ok(self.scale);
        }
        self.set_scale(available_width / page.width)
    }
}
