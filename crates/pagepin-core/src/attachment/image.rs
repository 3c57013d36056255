//! Image attachment.

use super::{AttachmentId, AttachmentTrait, GeometryPatch, SlotChange};
use crate::geometry::{FitBound, scale_to};
use crate::placement::PlacementId;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Image format for inline image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Where the image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Reference resolved by the renderer (object URL, file path, store key).
    Url(String),
    /// Bytes carried inline, base64-encoded so the record stays plain JSON.
    Inline {
        format: ImageFormat,
        data_base64: String,
    },
}

impl ImageSource {
    /// Wrap raw bytes, detecting the format from magic bytes.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        use base64::{Engine, engine::general_purpose::STANDARD};

        let format = ImageFormat::from_magic_bytes(data)?;
        Some(ImageSource::Inline {
            format,
            data_base64: STANDARD.encode(data),
        })
    }

    /// Decoded bytes for inline sources.
    pub fn data(&self) -> Option<Vec<u8>> {
        use base64::{Engine, engine::general_purpose::STANDARD};

        match self {
            ImageSource::Url(_) => None,
            ImageSource::Inline { data_base64, .. } => STANDARD.decode(data_base64).ok(),
        }
    }
}

/// An image attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub(crate) id: AttachmentId,
    /// Top-left corner.
    #[serde(flatten)]
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<PlacementId>,
    pub source: ImageSource,
    /// Original image width in pixels.
    pub natural_width: u32,
    /// Original image height in pixels.
    pub natural_height: u32,
}

impl ImageAttachment {
    /// Create an image displayed at its natural size.
    pub fn new(
        id: AttachmentId,
        position: Point,
        source: ImageSource,
        natural_width: u32,
        natural_height: u32,
    ) -> Self {
        Self {
            id,
            position,
            width: natural_width as f64,
            height: natural_height as f64,
            column_id: None,
            source,
            natural_width,
            natural_height,
        }
    }

    /// Shrink so the larger side is at most `max`, keeping the natural aspect ratio.
    pub fn fit_within(mut self, max: f64) -> Self {
        let fitted = scale_to(self.natural_size(), FitBound::Max(max));
        self.width = fitted.width;
        self.height = fitted.height;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Natural pixel size as floats.
    pub fn natural_size(&self) -> Size {
        Size::new(self.natural_width as f64, self.natural_height as f64)
    }
}

impl AttachmentTrait for ImageAttachment {
    fn id(&self) -> &AttachmentId {
        &self.id
    }

    fn position(&self) -> Point {
        self.position
    }

    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn column_id(&self) -> Option<&PlacementId> {
        self.column_id.as_ref()
    }

    fn aspect_source(&self) -> Size {
        if self.natural_width > 0 && self.natural_height > 0 {
            self.natural_size()
        } else {
            self.size()
        }
    }

    fn apply_geometry(&mut self, patch: &GeometryPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.width = size.width;
            self.height = size.height;
        }
        match &patch.slot {
            SlotChange::Keep => {}
            SlotChange::Snap(id) => self.column_id = Some(id.clone()),
            SlotChange::Release => self.column_id = None,
        }
    }

    fn map_units(&mut self, map: &dyn Fn(f64) -> f64) {
        self.position = Point::new(map(self.position.x), map(self.position.y));
        self.width = map(self.width);
        self.height = map(self.height);
    }
}
