//! Editor state for one loaded document and one view.

use crate::attachment::{Attachment, AttachmentId, ImageAttachment, ImageSource, TextAttachment};
use crate::config::EditorConfig;
use crate::geometry::{GeometryError, Scale, clamped_move};
use crate::interaction::{
    DragEvent, DragOutcome, EditOutcome, InteractionCoordinator, InteractionError, OverlaySnapshot, PageView,
};
use crate::placement::{Placement, PlacementError, PlacementId, PlacementResolver};
use crate::source::{DocumentSource, IdGenerator, PlacementProvider, UuidIds};
use crate::storage::{SavedDocument, Storage, StorageError};
use crate::store::{AttachmentStore, StoreError};
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};
use thiserror::Error;

/// Editor errors.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No document is loaded")]
    NoDocument,
    #[error("Document source has no size for page {0}")]
    MissingPageSize(usize),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Runtime editor state (not persisted).
///
/// Owns the canonical attachment store, the view's zoom level and the
/// interaction coordinator. A rendering layer drives it with gesture events
/// and reads visual copies back out.
pub struct Editor {
    config: EditorConfig,
    name: String,
    store: AttachmentStore,
    viewport: Viewport,
    interaction: InteractionCoordinator,
    page_sizes: Vec<Size>,
    placements: Vec<Vec<Placement>>,
    ids: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("name", &self.name)
            .field("pages", &self.page_sizes.len())
            .field("active_page", &self.store.active_page())
            .field("scale", &self.viewport.scale())
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Create an editor with no document loaded.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        let viewport = Viewport::with_limits(config.initial_scale, config.min_scale, config.max_scale)?;
        let interaction = InteractionCoordinator::new(config.drag_activation_distance);
        Ok(Self {
            config,
            name: String::new(),
            store: AttachmentStore::new(),
            viewport,
            interaction,
            page_sizes: Vec::new(),
            placements: Vec::new(),
            ids: Box::new(UuidIds),
        })
    }

    /// Replace the id generator.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Load a new document. Every existing attachment is dropped.
    pub fn load_document(
        &mut self,
        name: impl Into<String>,
        document: &impl DocumentSource,
        placements: &impl PlacementProvider,
    ) -> EditorResult<()> {
        let page_count = document.page_count();
        let page_sizes = (0..page_count)
            .map(|i| document.page_size(i).ok_or(EditorError::MissingPageSize(i)))
            .collect::<EditorResult<Vec<_>>>()?;

        let placements: Vec<Vec<Placement>> = (0..page_count).map(|i| placements.placements(i)).collect();
        for (slots, size) in placements.iter().zip(&page_sizes) {
            PlacementResolver::new(slots, *size)?;
        }

        self.name = name.into();
        self.page_sizes = page_sizes;
        self.placements = placements;
        self.store.reset(page_count);
        self.interaction = InteractionCoordinator::new(self.config.drag_activation_distance);
        log::info!("Loaded document '{}' with {} pages", self.name, page_count);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn interaction(&self) -> &InteractionCoordinator {
        &self.interaction
    }

    pub fn scale(&self) -> Scale {
        self.viewport.scale()
    }

    /// Set the zoom level, clamped to the configured limits.
    pub fn set_scale(&mut self, factor: f64) -> EditorResult<Scale> {
        Ok(self.viewport.set_scale(factor)?)
    }

    pub fn zoom_by(&mut self, factor: f64) -> EditorResult<Scale> {
        Ok(self.viewport.zoom_by(factor)?)
    }

    // --- Pages ---

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    pub fn active_page(&self) -> usize {
        self.store.active_page()
    }

    /// Canonical size of a page.
    pub fn page_size(&self, page_index: usize) -> Option<Size> {
        self.page_sizes.get(page_index).copied()
    }

    /// Slots registered on a page.
    pub fn placements(&self, page_index: usize) -> &[Placement] {
        self.placements.get(page_index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_active_page(&mut self, page_index: usize) -> usize {
        self.store.set_active_page(page_index)
    }

    pub fn next_page(&mut self) -> usize {
        self.set_active_page(self.active_page().saturating_add(1))
    }

    pub fn previous_page(&mut self) -> usize {
        self.set_active_page(self.active_page().saturating_sub(1))
    }

    pub fn is_first_page(&self) -> bool {
        self.active_page() == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.active_page() + 1 >= self.page_count()
    }

    pub fn is_multi_page(&self) -> bool {
        self.page_count() > 1
    }

    fn checked_page_size(&self, page_index: usize) -> EditorResult<Size> {
        if self.page_sizes.is_empty() {
            return Err(EditorError::NoDocument);
        }
        self.page_size(page_index).ok_or(EditorError::Store(StoreError::PageOutOfRange {
            index: page_index,
            page_count: self.page_count(),
        }))
    }

    // --- Adding and removing ---

    /// Add a text attachment built from the configured defaults at a canonical point.
    pub fn add_text(&mut self, page_index: usize, at: Point) -> EditorResult<AttachmentId> {
        let page_size = self.checked_page_size(page_index)?;
        let defaults = &self.config.text;
        let mut text = TextAttachment::new(self.ids.next_id(), at, defaults.content.clone())
            .with_size(defaults.width, defaults.height)
            .with_font_size(defaults.size)
            .with_line_height(defaults.line_height)
            .with_font_family(defaults.font);
        text.position = clamped_move(at, Vec2::ZERO, Size::new(text.width, text.height), page_size);
        self.insert(page_index, text.into())
    }

    /// Add an image at a canonical point, shrunk to the configured maximum size.
    pub fn add_image(
        &mut self,
        page_index: usize,
        at: Point,
        source: ImageSource,
        natural_width: u32,
        natural_height: u32,
    ) -> EditorResult<AttachmentId> {
        let page_size = self.checked_page_size(page_index)?;
        let mut image = ImageAttachment::new(self.ids.next_id(), at, source, natural_width, natural_height)
            .fit_within(self.config.image_max_size);
        image.position = clamped_move(at, Vec2::ZERO, Size::new(image.width, image.height), page_size);
        self.insert(page_index, image.into())
    }

    /// Add an attachment authored in this view's visual units.
    pub fn add_visual(&mut self, page_index: usize, visual: &Attachment) -> EditorResult<AttachmentId> {
        self.checked_page_size(page_index)?;
        let canonical = visual.to_canonical(self.scale());
        self.insert(page_index, canonical)
    }

    fn insert(&mut self, page_index: usize, attachment: Attachment) -> EditorResult<AttachmentId> {
        let id = attachment.id().clone();
        self.store.add(page_index, attachment)?;
        Ok(id)
    }

    /// Remove an attachment. Any gesture or edit on it is dropped.
    pub fn remove(&mut self, page_index: usize, id: &AttachmentId) -> EditorResult<bool> {
        self.interaction.forget(id);
        Ok(self.store.remove(page_index, id)?)
    }

    // --- Gestures ---

    /// Feed a drag event. A gesture stays on the page it started on, even if
    /// the active page changes before the drop.
    pub fn handle_drag(&mut self, event: DragEvent) -> EditorResult<DragOutcome> {
        let page_index = self
            .interaction
            .phase()
            .page_index()
            .unwrap_or_else(|| self.active_page());
        let page_size = self.checked_page_size(page_index)?;
        let view = PageView {
            page_index,
            page_size,
            placements: self.placements.get(page_index).map(Vec::as_slice).unwrap_or(&[]),
            scale: self.viewport.scale(),
        };
        self.interaction
            .handle(&mut self.store, &view, event)
            .inspect_err(|e| log::warn!("Drag event rejected: {}", e))
            .map_err(EditorError::from)
    }

    /// Enter text edit mode for an attachment on the active page.
    pub fn begin_edit(&mut self, id: &AttachmentId) -> EditorResult<Option<EditOutcome>> {
        let page_index = self.active_page();
        Ok(self.interaction.begin_edit(&mut self.store, page_index, id)?)
    }

    pub fn edit_text(&mut self, content: impl Into<String>) -> bool {
        self.interaction.edit_text(content)
    }

    /// Leave text edit mode, committing or removing the attachment.
    pub fn finish_edit(&mut self) -> EditorResult<Option<EditOutcome>> {
        Ok(self.interaction.finish_edit(&mut self.store)?)
    }

    // --- Rendering ---

    /// Visual copies of the active page's attachments, minus the one being dragged.
    pub fn render_attachments(&self) -> Vec<Attachment> {
        let scale = self.scale();
        self.store
            .current_page_attachments()
            .iter()
            .filter(|a| !self.interaction.is_hidden(a.id()))
            .map(|a| a.to_visual(scale))
            .collect()
    }

    /// The pointer-following overlay, while dragging.
    pub fn overlay(&self) -> Option<&OverlaySnapshot> {
        self.interaction.overlay()
    }

    /// Slots on the active page under a visual point, in defined order.
    pub fn placements_under_pointer(&self, visual: Point) -> EditorResult<Vec<PlacementId>> {
        let page_index = self.active_page();
        let resolver = PlacementResolver::new(self.placements(page_index), self.checked_page_size(page_index)?)?;
        Ok(resolver.placements_under(self.viewport.to_canonical_point(visual)))
    }

    /// Attachments on the active page under a visual point, topmost first.
    pub fn attachments_at(&self, visual: Point, tolerance: f64) -> Vec<AttachmentId> {
        let point = self.viewport.to_canonical_point(visual);
        let tolerance = self.scale().remove(tolerance);
        self.store
            .current_page_attachments()
            .iter()
            .rev()
            .filter(|a| a.hit_test(point, tolerance))
            .map(|a| a.id().clone())
            .collect()
    }

    // --- Saving ---

    /// Canonical per-page collections, ready for the persistence sink.
    ///
    /// Uncommitted edit text is not included.
    pub fn saved_document(&self) -> SavedDocument {
        SavedDocument::new(self.name.clone(), self.store.all_pages().to_vec())
    }

    /// Hand the canonical collections to a storage backend.
    pub async fn save(&self, storage: &dyn Storage, id: &str) -> EditorResult<()> {
        let document = self.saved_document();
        storage.save(id, &document).await?;
        log::info!(
            "Saved {} attachments over {} pages as '{}'",
            document.attachment_count(),
            document.page_count(),
            id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::PointerSample;
    use crate::source::{NoPlacements, SequentialIds, StaticDocument, StaticPlacements};
    use crate::storage::MemoryStorage;

    fn editor() -> Editor {
        let mut editor = Editor::new(EditorConfig::default())
            .unwrap()
            .with_id_generator(SequentialIds::new("a"));
        editor
            .load_document("doc.pdf", &StaticDocument::uniform(3, Size::new(600.0, 800.0)), &NoPlacements)
            .unwrap();
        editor
    }

    #[test]
    fn test_add_text_uses_defaults() {
        let mut editor = editor();
        let id = editor.add_text(0, Point::new(10.0, 20.0)).unwrap();
        assert_eq!(id.as_str(), "a-0");

        let text = editor.store().get(0, &id).and_then(Attachment::as_text).unwrap();
        assert_eq!(text.text, "Enter Text Here");
        assert!((text.width - 120.0).abs() < f64::EPSILON);
        assert!((text.font_size - 16.0).abs() < f64::EPSILON);
        assert!(!text.lines.is_empty());
    }

    #[test]
    fn test_add_text_clamped_to_page() {
        let mut editor = editor();
        let id = editor.add_text(0, Point::new(590.0, 790.0)).unwrap();
        let position = editor.store().get(0, &id).unwrap().position();
        assert_eq!(position, Point::new(480.0, 775.0));
    }

    #[test]
    fn test_add_image_fits_max_size() {
        let mut editor = editor();
        let id = editor
            .add_image(1, Point::new(50.0, 50.0), ImageSource::Url("sig.png".into()), 400, 200)
            .unwrap();
        let size = editor.store().get(1, &id).unwrap().size();
        assert!((size.width - 80.0).abs() < 1e-9);
        assert!((size.height - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_visual_stores_canonical() {
        let mut editor = editor();
        editor.set_scale(2.0).unwrap();
        let visual: Attachment = TextAttachment::new(AttachmentId::new("v"), Point::new(200.0, 100.0), "Hi")
            .with_size(240.0, 50.0)
            .with_font_size(32.0)
            .into();
        editor.add_visual(0, &visual).unwrap();

        let stored = editor.store().get(0, &AttachmentId::new("v")).and_then(Attachment::as_text).unwrap();
        assert_eq!(stored.position, Point::new(100.0, 50.0));
        assert!((stored.width - 120.0).abs() < 1e-9);
        assert!((stored.font_size - 16.0).abs() < 1e-9);

        let rendered = editor.render_attachments();
        assert_eq!(rendered[0].position(), Point::new(200.0, 100.0));
    }

    #[test]
    fn test_no_document() {
        let mut editor = Editor::new(EditorConfig::default()).unwrap();
        assert!(matches!(editor.add_text(0, Point::ZERO), Err(EditorError::NoDocument)));
        assert!(matches!(editor.handle_drag(DragEvent::Cancel), Err(EditorError::NoDocument)));
    }

    #[test]
    fn test_page_navigation() {
        let mut editor = editor();
        assert!(editor.is_first_page());
        assert!(editor.is_multi_page());
        assert_eq!(editor.next_page(), 1);
        assert_eq!(editor.next_page(), 2);
        assert_eq!(editor.next_page(), 2);
        assert!(editor.is_last_page());
        assert_eq!(editor.previous_page(), 1);
        editor.set_active_page(0);
        assert_eq!(editor.previous_page(), 0);
    }

    #[test]
    fn test_drag_hides_original_while_overlay_shown() {
        let mut editor = editor();
        let id = editor.add_text(0, Point::new(100.0, 100.0)).unwrap();
        editor
            .handle_drag(DragEvent::Start { id: id.clone(), at: PointerSample::at(0.0, 0.0) })
            .unwrap();
        editor.handle_drag(DragEvent::Move { at: PointerSample::at(33.0, 0.0) }).unwrap();
        assert!(editor.render_attachments().is_empty());
        let overlay = editor.overlay().unwrap();
        assert!((overlay.visual_bounds().x0 - (165.0 + 33.0)).abs() < 1e-9);

        let outcome = editor
            .handle_drag(DragEvent::Drop { at: PointerSample::at(33.0, 0.0), over: vec![] })
            .unwrap();
        assert!(matches!(outcome, DragOutcome::Committed(_)));
        // 33 visual px at scale 1.65 is 20 canonical units
        let position = editor.store().get(0, &id).unwrap().position();
        assert!((position.x - 120.0).abs() < 1e-9);
        assert_eq!(editor.render_attachments().len(), 1);
    }

    #[test]
    fn test_page_change_mid_drag_keeps_gesture_page() {
        let mut editor = Editor::new(EditorConfig::default()).unwrap();
        let pages = StaticDocument::new(vec![Size::new(600.0, 800.0), Size::new(200.0, 200.0)]);
        editor.load_document("mixed.pdf", &pages, &NoPlacements).unwrap();
        editor.set_scale(1.0).unwrap();
        let id = editor.add_text(0, Point::new(100.0, 500.0)).unwrap();

        editor
            .handle_drag(DragEvent::Start { id: id.clone(), at: PointerSample::at(0.0, 0.0) })
            .unwrap();
        editor.handle_drag(DragEvent::Move { at: PointerSample::at(10.0, 10.0) }).unwrap();
        assert_eq!(editor.next_page(), 1);
        editor
            .handle_drag(DragEvent::Drop { at: PointerSample::at(10.0, 10.0), over: vec![] })
            .unwrap();

        assert_eq!(editor.store().get(0, &id).unwrap().position(), Point::new(110.0, 510.0));
    }

    #[test]
    fn test_placements_under_pointer() {
        let mut editor = Editor::new(EditorConfig::default()).unwrap();
        let placements = StaticPlacements::new(vec![vec![
            Placement::new("p1", 200.0, 200.0, 80.0, 40.0),
            Placement::new("p2", 220.0, 210.0, 80.0, 40.0),
        ]]);
        editor
            .load_document("form.pdf", &StaticDocument::uniform(1, Size::new(600.0, 800.0)), &placements)
            .unwrap();
        editor.set_scale(2.0).unwrap();
        let under = editor.placements_under_pointer(Point::new(460.0, 440.0)).unwrap();
        assert_eq!(under, vec![PlacementId::new("p1"), PlacementId::new("p2")]);
        assert!(editor.placements_under_pointer(Point::new(10.0, 10.0)).unwrap().is_empty());
    }

    #[test]
    fn test_attachments_at_topmost_first() {
        let mut editor = editor();
        editor.set_scale(1.0).unwrap();
        let first = editor.add_text(0, Point::new(100.0, 100.0)).unwrap();
        let second = editor.add_text(0, Point::new(150.0, 110.0)).unwrap();
        assert_eq!(editor.attachments_at(Point::new(160.0, 115.0), 0.0), vec![second, first]);
    }

    #[test]
    fn test_remove_drops_edit_session() {
        let mut editor = editor();
        let id = editor.add_text(0, Point::ZERO).unwrap();
        editor.begin_edit(&id).unwrap();
        assert!(editor.remove(0, &id).unwrap());
        assert!(editor.interaction().editing().is_none());
        assert_eq!(editor.finish_edit().unwrap(), None);
    }

    #[test]
    fn test_save_hands_over_canonical_pages() {
        let mut editor = editor();
        editor.set_scale(3.0).unwrap();
        let id = editor.add_text(2, Point::new(40.0, 60.0)).unwrap();

        let storage = MemoryStorage::new();
        pollster::block_on(editor.save(&storage, "doc")).unwrap();
        let saved = pollster::block_on(storage.load("doc")).unwrap();
        assert_eq!(saved.name, "doc.pdf");
        assert_eq!(saved.page_count(), 3);
        assert_eq!(saved.pages[2][0].id(), &id);
        assert_eq!(saved.pages[2][0].position(), Point::new(40.0, 60.0));
    }

    #[test]
    fn test_load_document_resets() {
        let mut editor = editor();
        editor.add_text(0, Point::ZERO).unwrap();
        editor.set_active_page(2);
        editor
            .load_document("next.pdf", &StaticDocument::uniform(1, Size::new(300.0, 300.0)), &NoPlacements)
            .unwrap();
        assert!(editor.store().is_empty());
        assert_eq!(editor.page_count(), 1);
        assert_eq!(editor.active_page(), 0);
        assert!(!editor.is_multi_page());
    }
}
