//! Storage abstraction for saved attachment sets.
//!
//! Saving hands the canonical per-page collections to a backend. Nothing is
//! ever stored in visual units. Every backend accepts the same ids and
//! refuses documents that could not be loaded back into an
//! [`AttachmentStore`](crate::store::AttachmentStore).

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::attachment::AttachmentId;
use crate::store::PageAttachments;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid document id {0:?}")]
    InvalidId(String),
    #[error("Document {id} cannot be restored: {reason}")]
    InvalidDocument { id: String, reason: String },
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Longest accepted document id, in bytes.
pub const MAX_ID_LEN: usize = 180;

/// Check that `id` can name a saved document in every backend.
pub fn check_id(id: &str) -> StorageResult<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN || id.chars().any(char::is_control) {
        return Err(StorageError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The payload handed to a save: document name plus canonical attachments per page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedDocument {
    pub name: String,
    pub pages: Vec<PageAttachments>,
}

impl SavedDocument {
    pub fn new(name: impl Into<String>, pages: Vec<PageAttachments>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total attachments over all pages.
    pub fn attachment_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    /// Check the document can be restored: attachment ids unique across all
    /// pages, finite geometry everywhere.
    pub fn validate(&self, id: &str) -> StorageResult<()> {
        let invalid = |reason: String| StorageError::InvalidDocument {
            id: id.to_string(),
            reason,
        };
        let mut seen: HashSet<&AttachmentId> = HashSet::new();
        for (page_index, page) in self.pages.iter().enumerate() {
            for attachment in page {
                if !seen.insert(attachment.id()) {
                    return Err(invalid(format!("attachment {} appears twice", attachment.id())));
                }
                if !attachment.bounds().is_finite() {
                    return Err(invalid(format!(
                        "attachment {} on page {} has non-finite geometry",
                        attachment.id(),
                        page_index
                    )));
                }
            }
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Trait for saved-document backends.
pub trait Storage: Send + Sync {
    /// Save a document, replacing any previous one with the same id.
    fn save(&self, id: &str, document: &SavedDocument) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a document.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SavedDocument>>;

    /// Delete a document.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all document IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
