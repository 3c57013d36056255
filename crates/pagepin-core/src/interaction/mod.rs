//! Interaction coordinator: drag gestures and text editing.
//!
//! Attachments stay pure data in the [`AttachmentStore`]. The coordinator owns
//! the transient gesture state and is the only thing that commits gesture
//! results back into the store:
//! - a drag is a small state machine (idle, pending, dragging) driven by typed
//!   [`DragEvent`]s through [`InteractionCoordinator::handle`]
//! - text editing is a separate mode that suspends dragging for that attachment

mod drag;
mod edit;

pub use drag::{DragEvent, DragPhase, DragSession, OverlaySnapshot, PendingDrag, PointerSample};
pub use edit::{EditOutcome, TextEditSession};

use crate::attachment::AttachmentId;
use crate::geometry::Scale;
use crate::placement::{Placement, PlacementError, PlacementId, PlacementResolver, Resolution};
use crate::store::{AttachmentStore, StoreError, UpdateOutcome};
use kurbo::Size;
use thiserror::Error;

/// Default pointer travel, in visual pixels, before a press becomes a drag.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 1.0;

/// Interaction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InteractionError {
    #[error("A gesture is already active on attachment {0}")]
    DragInProgress(AttachmentId),
    #[error("Attachment not found on page {page_index}: {id}")]
    NoSuchAttachment { id: AttachmentId, page_index: usize },
    #[error("Gesture belongs to page {expected}, got an event for page {found}")]
    PageMismatch { expected: usize, found: usize },
    #[error("Attachment {0} is not a text attachment")]
    NotEditable(AttachmentId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// Result type for interaction operations.
pub type InteractionResult<T> = Result<T, InteractionError>;

/// The page a gesture happens on, as seen by one view.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub page_index: usize,
    /// Canonical page size, used as movement bounds.
    pub page_size: Size,
    pub placements: &'a [Placement],
    pub scale: Scale,
}

/// Result of feeding one event to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Event had no effect in the current phase.
    Ignored,
    /// Pointer is down but still under the activation distance.
    Pending,
    /// A drag session opened.
    Started,
    /// The open session tracked the pointer.
    Moved,
    /// The drop was resolved and written to the store.
    Committed(Resolution),
    /// The gesture ended under the activation distance; left to click handlers.
    Click(AttachmentId),
    /// The gesture was discarded without touching the store.
    Cancelled,
}

/// Owns drag and edit state for one document view.
#[derive(Debug, Clone)]
pub struct InteractionCoordinator {
    phase: DragPhase,
    editing: Option<TextEditSession>,
    activation_distance: f64,
}

impl Default for InteractionCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl InteractionCoordinator {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            phase: DragPhase::Idle,
            editing: None,
            activation_distance: activation_distance.max(0.0),
        }
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    /// Check if a drag session is open.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.phase {
            DragPhase::Dragging(session) => Some(session),
            _ => None,
        }
    }

    /// The pointer-following overlay, while dragging.
    pub fn overlay(&self) -> Option<&OverlaySnapshot> {
        self.session().map(|s| &s.overlay)
    }

    /// Check if the given attachment should be hidden in favour of the overlay.
    pub fn is_hidden(&self, id: &AttachmentId) -> bool {
        self.session().is_some_and(|s| &s.attachment_id == id)
    }

    pub fn editing(&self) -> Option<&TextEditSession> {
        self.editing.as_ref()
    }

    /// Check if a specific attachment is being edited.
    pub fn is_editing(&self, id: &AttachmentId) -> bool {
        self.editing.as_ref().is_some_and(|e| &e.attachment_id == id)
    }

    /// Feed one drag event through the state machine.
    ///
    /// Moves and drops must come with a view of the page the gesture started on.
    pub fn handle(
        &mut self,
        store: &mut AttachmentStore,
        view: &PageView<'_>,
        event: DragEvent,
    ) -> InteractionResult<DragOutcome> {
        if !matches!(event, DragEvent::Start { .. } | DragEvent::Cancel) {
            if let Some(expected) = self.phase.page_index().filter(|&p| p != view.page_index) {
                return Err(InteractionError::PageMismatch {
                    expected,
                    found: view.page_index,
                });
            }
        }

        let threshold = self.activation_distance;
        match event {
            DragEvent::Start { id, at } => {
                if let Some(active) = self.phase.attachment_id() {
                    return Err(InteractionError::DragInProgress(active.clone()));
                }
                if self.is_editing(&id) {
                    log::debug!("Drag on {} suspended while editing", id);
                    return Ok(DragOutcome::Ignored);
                }
                if store.get(view.page_index, &id).is_none() {
                    return Err(InteractionError::NoSuchAttachment {
                        id,
                        page_index: view.page_index,
                    });
                }
                log::debug!("Pointer down on {}", id);
                self.phase = DragPhase::Pending(PendingDrag {
                    attachment_id: id,
                    page_index: view.page_index,
                    origin: at,
                });
                Ok(DragOutcome::Pending)
            }
            DragEvent::Move { at } => match &mut self.phase {
                DragPhase::Idle => Ok(DragOutcome::Ignored),
                DragPhase::Dragging(session) => {
                    session.track(at);
                    Ok(DragOutcome::Moved)
                }
                DragPhase::Pending(pending) => {
                    if !exceeds_activation(pending, at, threshold) {
                        return Ok(DragOutcome::Pending);
                    }
                    let Some(mut session) = activate(store, pending, view.scale) else {
                        self.phase = DragPhase::Idle;
                        return Ok(DragOutcome::Ignored);
                    };
                    session.track(at);
                    self.phase = DragPhase::Dragging(session);
                    Ok(DragOutcome::Started)
                }
            },
            DragEvent::Drop { at, over } => match std::mem::take(&mut self.phase) {
                DragPhase::Idle => Ok(DragOutcome::Ignored),
                DragPhase::Pending(pending) => {
                    // Press and release with no move in between still counts as a drag when far apart
                    if !exceeds_activation(&pending, at, threshold) {
                        return Ok(DragOutcome::Click(pending.attachment_id));
                    }
                    match activate(store, &pending, view.scale) {
                        Some(session) => commit(store, view, session, at, &over),
                        None => Ok(DragOutcome::Ignored),
                    }
                }
                DragPhase::Dragging(session) => commit(store, view, session, at, &over),
            },
            DragEvent::Cancel => match std::mem::take(&mut self.phase) {
                DragPhase::Idle => Ok(DragOutcome::Ignored),
                phase => {
                    if let Some(id) = phase.attachment_id() {
                        log::debug!("Drag on {} cancelled", id);
                    }
                    Ok(DragOutcome::Cancelled)
                }
            },
        }
    }

    /// Enter edit mode for a text attachment.
    ///
    /// Any other attachment still in edit mode is finished first; its outcome is returned.
    pub fn begin_edit(
        &mut self,
        store: &mut AttachmentStore,
        page_index: usize,
        id: &AttachmentId,
    ) -> InteractionResult<Option<EditOutcome>> {
        if self.phase.attachment_id() == Some(id) {
            return Err(InteractionError::DragInProgress(id.clone()));
        }
        if self.is_editing(id) {
            return Ok(None);
        }
        let content = match store.get(page_index, id) {
            None => {
                return Err(InteractionError::NoSuchAttachment {
                    id: id.clone(),
                    page_index,
                });
            }
            Some(attachment) => attachment
                .as_text()
                .map(|t| t.text.clone())
                .ok_or_else(|| InteractionError::NotEditable(id.clone()))?,
        };

        let previous = self.finish_edit(store)?;
        log::debug!("Editing {}", id);
        self.editing = Some(TextEditSession::new(id.clone(), page_index, content));
        Ok(previous)
    }

    /// Replace the uncommitted content. Returns `false` when not editing.
    pub fn edit_text(&mut self, content: impl Into<String>) -> bool {
        match &mut self.editing {
            Some(session) => {
                session.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Leave edit mode (blur). Empty content removes the attachment.
    pub fn finish_edit(&mut self, store: &mut AttachmentStore) -> InteractionResult<Option<EditOutcome>> {
        let Some(session) = self.editing.take() else {
            return Ok(None);
        };

        if session.is_empty() {
            let removed = store.remove(session.page_index, &session.attachment_id)?;
            log::debug!("Empty text {} removed", session.attachment_id);
            return Ok(Some(if removed { EditOutcome::Removed } else { EditOutcome::Missing }));
        }

        let patch = match store
            .get(session.page_index, &session.attachment_id)
            .and_then(|a| a.as_text())
        {
            Some(text) => text.content_patch(&session.content),
            None => return Ok(Some(EditOutcome::Missing)),
        };
        let outcome = store.update(session.page_index, &session.attachment_id, &patch.into())?;
        Ok(Some(match outcome {
            UpdateOutcome::Applied => EditOutcome::Committed,
            UpdateOutcome::Missing => EditOutcome::Missing,
        }))
    }

    /// Drop any gesture or edit state referring to `id`.
    pub fn forget(&mut self, id: &AttachmentId) {
        if self.phase.attachment_id() == Some(id) {
            self.phase = DragPhase::Idle;
        }
        if self.is_editing(id) {
            self.editing = None;
        }
    }
}

fn exceeds_activation(pending: &PendingDrag, at: PointerSample, threshold: f64) -> bool {
    (at.anchor() - pending.origin.anchor()).hypot() > threshold
}

/// Open a drag session for a pending press. `None` when the attachment is gone.
fn activate(store: &AttachmentStore, pending: &PendingDrag, scale: Scale) -> Option<DragSession> {
    let Some(original) = store.get(pending.page_index, &pending.attachment_id).cloned() else {
        log::debug!("Attachment {} removed before drag activation", pending.attachment_id);
        return None;
    };
    let origin = pending.origin.anchor();
    log::debug!("Drag started on {}", pending.attachment_id);
    Some(DragSession {
        attachment_id: pending.attachment_id.clone(),
        page_index: pending.page_index,
        origin,
        current: origin,
        overlay: OverlaySnapshot::new(&original, scale),
        original,
    })
}

fn commit(
    store: &mut AttachmentStore,
    view: &PageView<'_>,
    mut session: DragSession,
    at: PointerSample,
    over: &[PlacementId],
) -> InteractionResult<DragOutcome> {
    session.track(at);
    let resolver = PlacementResolver::new(view.placements, view.page_size)?;
    let resolution = resolver.resolve(&session.original, session.delta(), over, view.scale)?;
    let outcome = store.update(
        session.page_index,
        &session.attachment_id,
        &resolution.to_patch().into(),
    )?;
    if outcome == UpdateOutcome::Missing {
        log::debug!("Dropped attachment {} no longer exists", session.attachment_id);
    }
    Ok(DragOutcome::Committed(resolution))
}
