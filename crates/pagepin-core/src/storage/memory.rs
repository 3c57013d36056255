//! In-memory storage, for tests and hosts without a filesystem.

use super::{BoxFuture, SavedDocument, Storage, StorageError, StorageResult, check_id};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Saved documents kept in a map ordered by id.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<BTreeMap<String, SavedDocument>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, BTreeMap<String, SavedDocument>>> {
        self.documents
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, BTreeMap<String, SavedDocument>>> {
        self.documents
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }

    fn put(&self, id: &str, document: &SavedDocument) -> StorageResult<()> {
        check_id(id)?;
        document.validate(id)?;
        let replaced = self.write()?.insert(id.to_string(), document.clone()).is_some();
        log::debug!(
            "{} {} in memory ({} attachments on {} pages)",
            if replaced { "Replaced" } else { "Saved" },
            id,
            document.attachment_count(),
            document.page_count()
        );
        Ok(())
    }

    fn get(&self, id: &str) -> StorageResult<SavedDocument> {
        check_id(id)?;
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &SavedDocument) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.put(id, document);
        Box::pin(async move { result })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SavedDocument>> {
        let result = self.get(id);
        Box::pin(async move { result })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = check_id(id).and_then(|()| {
            self.write()?.remove(id);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let result: StorageResult<Vec<String>> = self.read().map(|docs| docs.keys().cloned().collect());
        Box::pin(async move { result })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let result = check_id(id).and_then(|()| Ok(self.read()?.contains_key(id)));
        Box::pin(async move { result })
    }
}
