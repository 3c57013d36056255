//! Per-page attachment collections for one loaded document.

use crate::attachment::{Attachment, AttachmentId, AttachmentKind, AttachmentPatch};
use crate::geometry::Scale;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attachments on one page, in insertion order.
pub type PageAttachments = Vec<Attachment>;

/// Attachment store errors. All of these are caller bugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Attachment id already exists in this document: {0}")]
    DuplicateId(AttachmentId),
    #[error("Page index {index} out of range (document has {page_count} pages)")]
    PageOutOfRange { index: usize, page_count: usize },
    #[error("Patch does not apply to {kind} attachment {id}")]
    PatchMismatch { id: AttachmentId, kind: AttachmentKind },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The patch was merged.
    Applied,
    /// No attachment with that id; treated as a race with a removal.
    Missing,
}

/// Canonical attachment state for every page of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentStore {
    pages: Vec<PageAttachments>,
    active_page: usize,
}

impl AttachmentStore {
    /// Create an empty store with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `page_count` empty pages.
    pub fn with_pages(page_count: usize) -> Self {
        let mut store = Self::new();
        store.reset(page_count);
        store
    }

    /// Drop every attachment and size the store for a newly loaded document.
    pub fn reset(&mut self, page_count: usize) {
        self.pages = vec![Vec::new(); page_count];
        self.active_page = 0;
        log::info!("Attachment store reset for {} pages", page_count);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn check_page(&self, index: usize) -> StoreResult<()> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(StoreError::PageOutOfRange {
                index,
                page_count: self.pages.len(),
            })
        }
    }

    /// Page index holding the attachment with `id`, if any.
    pub fn locate(&self, id: &AttachmentId) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.iter().any(|a| a.id() == id))
    }

    pub fn contains(&self, id: &AttachmentId) -> bool {
        self.locate(id).is_some()
    }

    /// Append an attachment to a page. Ids are unique across the whole document.
    pub fn add(&mut self, page_index: usize, attachment: Attachment) -> StoreResult<()> {
        self.check_page(page_index)?;
        if self.contains(attachment.id()) {
            return Err(StoreError::DuplicateId(attachment.id().clone()));
        }
        log::debug!("Adding {} attachment {} to page {}", attachment.kind(), attachment.id(), page_index);
        self.pages[page_index].push(attachment);
        Ok(())
    }

    /// Merge a patch into an existing attachment.
    pub fn update(
        &mut self,
        page_index: usize,
        id: &AttachmentId,
        patch: &AttachmentPatch,
    ) -> StoreResult<UpdateOutcome> {
        self.check_page(page_index)?;
        let Some(attachment) = self.pages[page_index].iter_mut().find(|a| a.id() == id) else {
            log::debug!("Update for missing attachment {} on page {} ignored", id, page_index);
            return Ok(UpdateOutcome::Missing);
        };

        // Validate against a copy so a rejected patch leaves the record untouched
        let mut updated = attachment.clone();
        if !updated.apply(patch) {
            return Err(StoreError::PatchMismatch {
                id: id.clone(),
                kind: attachment.kind(),
            });
        }
        *attachment = updated;
        Ok(UpdateOutcome::Applied)
    }

    /// Delete an attachment. Returns whether anything was removed.
    pub fn remove(&mut self, page_index: usize, id: &AttachmentId) -> StoreResult<bool> {
        self.check_page(page_index)?;
        let page = &mut self.pages[page_index];
        let before = page.len();
        page.retain(|a| a.id() != id);
        let removed = page.len() != before;
        if removed {
            log::debug!("Removed attachment {} from page {}", id, page_index);
        }
        Ok(removed)
    }

    /// Get an attachment by page and id.
    pub fn get(&self, page_index: usize, id: &AttachmentId) -> Option<&Attachment> {
        self.pages.get(page_index)?.iter().find(|a| a.id() == id)
    }

    /// Select the page exposed as current, clamped to the valid range.
    pub fn set_active_page(&mut self, page_index: usize) -> usize {
        self.active_page = page_index.min(self.pages.len().saturating_sub(1));
        self.active_page
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    /// Attachments on the active page.
    pub fn current_page_attachments(&self) -> &[Attachment] {
        self.pages
            .get(self.active_page)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Attachments on one page.
    pub fn page(&self, page_index: usize) -> StoreResult<&[Attachment]> {
        self.check_page(page_index)?;
        Ok(&self.pages[page_index])
    }

    /// Every page collection, indexed by page.
    pub fn all_pages(&self) -> &[PageAttachments] {
        &self.pages
    }

    /// Visual copies of one page's attachments for rendering.
    pub fn visual_page(&self, page_index: usize, scale: Scale) -> StoreResult<Vec<Attachment>> {
        Ok(self
            .page(page_index)?
            .iter()
            .map(|a| a.to_visual(scale))
            .collect())
    }

    /// Total number of attachments.
    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{GeometryPatch, ImageAttachment, ImageSource, TextAttachment, TextContentPatch};
    use kurbo::Point;

    fn text(id: &str) -> Attachment {
        TextAttachment::new(AttachmentId::new(id), Point::new(100.0, 100.0), "Hello").into()
    }

    fn image(id: &str) -> Attachment {
        ImageAttachment::new(AttachmentId::new(id), Point::ZERO, ImageSource::Url("a.png".into()), 20, 10).into()
    }

    #[test]
    fn test_reset_sizes_pages() {
        let mut store = AttachmentStore::with_pages(2);
        store.add(1, text("a")).unwrap();
        store.set_active_page(1);

        store.reset(3);
        assert_eq!(store.page_count(), 3);
        assert!(store.is_empty());
        assert_eq!(store.active_page(), 0);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut store = AttachmentStore::with_pages(1);
        store.add(0, text("a")).unwrap();
        store.add(0, image("b")).unwrap();
        store.add(0, text("c")).unwrap();
        let ids: Vec<_> = store.page(0).unwrap().iter().map(|a| a.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_id_across_pages_rejected() {
        let mut store = AttachmentStore::with_pages(2);
        store.add(0, text("a")).unwrap();
        let err = store.add(1, text("a")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(AttachmentId::new("a")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_page_out_of_range() {
        let mut store = AttachmentStore::with_pages(1);
        assert!(matches!(store.add(3, text("a")), Err(StoreError::PageOutOfRange { index: 3, page_count: 1 })));
        assert!(store.update(3, &AttachmentId::new("a"), &GeometryPatch::default().into()).is_err());
        assert!(store.remove(3, &AttachmentId::new("a")).is_err());
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = AttachmentStore::with_pages(1);
        store.add(0, text("a")).unwrap();
        let outcome = store
            .update(0, &AttachmentId::new("a"), &GeometryPatch::moved_to(Point::new(5.0, 6.0)).into())
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);

        let updated = store.get(0, &AttachmentId::new("a")).unwrap().as_text().unwrap();
        assert_eq!(updated.position, Point::new(5.0, 6.0));
        assert_eq!(updated.text, "Hello");
        assert!((updated.width - TextAttachment::DEFAULT_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = AttachmentStore::with_pages(1);
        store.add(0, text("a")).unwrap();
        let before = store.clone();
        let outcome = store
            .update(0, &AttachmentId::new("gone"), &GeometryPatch::moved_to(Point::ZERO).into())
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Missing);
        assert_eq!(store, before);
    }

    #[test]
    fn test_update_rejects_mismatched_patch() {
        let mut store = AttachmentStore::with_pages(1);
        store.add(0, image("b")).unwrap();
        let before = store.clone();
        let err = store
            .update(0, &AttachmentId::new("b"), &TextContentPatch::default().into())
            .unwrap_err();
        assert!(matches!(err, StoreError::PatchMismatch { kind: AttachmentKind::Image, .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = AttachmentStore::with_pages(1);
        store.add(0, text("a")).unwrap();
        assert!(store.remove(0, &AttachmentId::new("a")).unwrap());
        assert!(!store.remove(0, &AttachmentId::new("a")).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_active_page_clamps() {
        let mut store = AttachmentStore::with_pages(3);
        assert_eq!(store.set_active_page(7), 2);
        assert_eq!(store.set_active_page(1), 1);

        let mut empty = AttachmentStore::new();
        assert_eq!(empty.set_active_page(4), 0);
        assert!(empty.current_page_attachments().is_empty());
    }

    #[test]
    fn test_current_page_follows_active_page() {
        let mut store = AttachmentStore::with_pages(2);
        store.add(0, text("a")).unwrap();
        store.add(1, text("b")).unwrap();
        store.set_active_page(1);
        let current: Vec<_> = store.current_page_attachments().iter().map(|a| a.id().as_str()).collect();
        assert_eq!(current, vec!["b"]);
        assert_eq!(store.all_pages().len(), 2);
    }

    #[test]
    fn test_visual_page_leaves_store_canonical() {
        let mut store = AttachmentStore::with_pages(1);
        store.add(0, text("a")).unwrap();
        let visual = store.visual_page(0, Scale::new(2.0).unwrap()).unwrap();
        assert_eq!(visual[0].position(), Point::new(200.0, 200.0));
        assert_eq!(store.page(0).unwrap()[0].position(), Point::new(100.0, 100.0));
    }
}
