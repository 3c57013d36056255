//! Free-text attachment.

use super::{AttachmentId, AttachmentTrait, GeometryPatch, SlotChange, TextContentPatch};
use crate::placement::PlacementId;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Font family options, mapped onto the PDF standard fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Times Roman (default).
    #[default]
    #[serde(rename = "Times-Roman")]
    TimesRoman,
    #[serde(rename = "Helvetica")]
    Helvetica,
    #[serde(rename = "Courier")]
    Courier,
}

impl FontFamily {
    /// Get the font name as understood by the document writer.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::TimesRoman => "Times-Roman",
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Courier => "Courier",
        }
    }

    /// Average glyph advance as a fraction of the font size.
    ///
    /// Rough empirical values; only used to derive wrapped lines.
    pub fn char_width_factor(&self) -> f64 {
        match self {
            FontFamily::TimesRoman => 0.5,
            FontFamily::Helvetica => 0.55,
            FontFamily::Courier => 0.6,
        }
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::TimesRoman,
            FontFamily::Helvetica,
            FontFamily::Courier,
        ]
    }
}

/// A free-text attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAttachment {
    pub(crate) id: AttachmentId,
    /// Top-left corner.
    #[serde(flatten)]
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Slot this text is snapped into, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<PlacementId>,
    /// The text content.
    pub text: String,
    /// Font size, in the same units as the geometry.
    #[serde(rename = "size")]
    pub font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    pub font_family: FontFamily,
    /// Wrapped display lines derived from `text`.
    #[serde(default)]
    pub lines: Vec<String>,
}

impl TextAttachment {
    pub const DEFAULT_WIDTH: f64 = 120.0;
    pub const DEFAULT_HEIGHT: f64 = 25.0;
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const DEFAULT_LINE_HEIGHT: f64 = 1.4;

    /// Create a new text attachment with default metrics.
    pub fn new(id: AttachmentId, position: Point, text: impl Into<String>) -> Self {
        let mut attachment = Self {
            id,
            position,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            column_id: None,
            text: text.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            line_height: Self::DEFAULT_LINE_HEIGHT,
            font_family: FontFamily::default(),
            lines: Vec::new(),
        };
        attachment.rewrap();
        attachment
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self.rewrap();
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self.rewrap();
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self.rewrap();
        self
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.text
    }

    /// Build the patch that commits `content` with freshly wrapped lines.
    pub fn content_patch(&self, content: &str) -> TextContentPatch {
        TextContentPatch {
            text: content.to_string(),
            lines: wrap_lines(content, self.width, self.font_size, self.font_family),
        }
    }

    /// Recompute `lines` from `text`.
    pub fn rewrap(&mut self) {
        self.lines = wrap_lines(&self.text, self.width, self.font_size, self.font_family);
    }

    pub(crate) fn apply_content(&mut self, patch: &TextContentPatch) {
        self.text = patch.text.clone();
        self.lines = patch.lines.clone();
    }
}

impl AttachmentTrait for TextAttachment {
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

    fn apply_geometry(&mut self, patch: &GeometryPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.width = size.width;
            self.height = size.height;
            self.rewrap();
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
        self.font_size = map(self.font_size);
    }
}

/// Wrap `text` into display lines for a box of `width` at `font_size`.
///
/// Hard newlines always break. Words are packed greedily; a word longer than a
/// whole line is split across lines.
pub fn wrap_lines(text: &str, width: f64, font_size: f64, family: FontFamily) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let glyph = font_size * family.char_width_factor();
    let per_line = if glyph > 0.0 && width.is_finite() && width > 0.0 {
        ((width / glyph).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();

            // Break words that cannot fit on an empty line
            while chars.len() > per_line {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = chars.split_off(per_line);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            if chars.is_empty() {
                continue;
            }

            let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
            if needed > per_line {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += chars.len();
            current.extend(chars);
        }

        lines.push(current);
    }
    lines
}
