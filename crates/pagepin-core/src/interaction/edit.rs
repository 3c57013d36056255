//! Text editing session state.

use crate::attachment::AttachmentId;

/// A text attachment currently in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditSession {
    pub attachment_id: AttachmentId,
    pub page_index: usize,
    /// Uncommitted content.
    pub content: String,
}

impl TextEditSession {
    pub fn new(attachment_id: AttachmentId, page_index: usize, content: impl Into<String>) -> Self {
        Self {
            attachment_id,
            page_index,
            content: content.into(),
        }
    }

    /// Check if leaving edit mode now would remove the attachment.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// What happened when edit mode was left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content and wrapped lines were written back.
    Committed,
    /// Content was empty, so the attachment was removed.
    Removed,
    /// The attachment vanished while being edited.
    Missing,
}
