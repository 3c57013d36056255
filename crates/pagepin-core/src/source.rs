//! Seams to the host: document metadata, placement regions and id generation.

use crate::attachment::AttachmentId;
use crate::placement::Placement;
use kurbo::Size;

/// Page metadata of the loaded document.
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    /// Canonical size of one page.
    fn page_size(&self, page_index: usize) -> Option<Size>;
}

/// Supplies the predefined slots of each page.
pub trait PlacementProvider {
    fn placements(&self, page_index: usize) -> Vec<Placement>;
}

/// Produces unique attachment ids.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> AttachmentId;
}

/// Random v4 UUID ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> AttachmentId {
        AttachmentId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic ids such as `a-0`, `a-1`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> AttachmentId {
        let id = AttachmentId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// A document described by its page sizes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticDocument {
    pub pages: Vec<Size>,
}

impl StaticDocument {
    pub fn new(pages: Vec<Size>) -> Self {
        Self { pages }
    }

    /// `page_count` pages of the same size.
    pub fn uniform(page_count: usize, size: Size) -> Self {
        Self::new(vec![size; page_count])
    }
}

impl DocumentSource for StaticDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page_index: usize) -> Option<Size> {
        self.pages.get(page_index).copied()
    }
}

/// Fixed placements per page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticPlacements {
    pub pages: Vec<Vec<Placement>>,
}

impl StaticPlacements {
    pub fn new(pages: Vec<Vec<Placement>>) -> Self {
        Self { pages }
    }
}

impl PlacementProvider for StaticPlacements {
    fn placements(&self, page_index: usize) -> Vec<Placement> {
        self.pages.get(page_index).cloned().unwrap_or_default()
    }
}

/// A document without slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlacements;

impl PlacementProvider for NoPlacements {
    fn placements(&self, _page_index: usize) -> Vec<Placement> {
        Vec::new()
    }
}
