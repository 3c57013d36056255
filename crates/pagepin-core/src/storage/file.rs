//! File-based storage: one JSON file per saved document.
//!
//! File names are the URL-safe base64 of the document id, so distinct ids
//! never share a file and `list` can hand back the ids exactly as saved.

use super::{BoxFuture, SavedDocument, Storage, StorageError, StorageResult, check_id};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Stores saved documents as JSON files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Io(format!("Failed to create {}: {}", base_path.display(), e))
        })?;
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/pagepin/attachments/`
    /// On Windows: `%LOCALAPPDATA%\pagepin\attachments\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("pagepin").join("attachments"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, id: &str) -> StorageResult<PathBuf> {
        check_id(id)?;
        let stem = URL_SAFE_NO_PAD.encode(id.as_bytes());
        Ok(self.base_path.join(format!("{}.{}", stem, EXTENSION)))
    }
}

/// Recover the document id from a file written by [`FileStorage`].
fn id_from_path(path: &Path) -> Option<String> {
    if path.extension()? != EXTENSION {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(path.file_stem()?.to_str()?).ok()?;
    let id = String::from_utf8(bytes).ok()?;
    check_id(&id).ok()?;
    Some(id)
}

fn read_document(id: &str, path: &Path) -> StorageResult<SavedDocument> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Err(e) => return Err(StorageError::Io(format!("Failed to read {}: {}", path.display(), e))),
    };
    let document = SavedDocument::from_json(&json)
        .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))?;
    document.validate(id)?;
    Ok(document)
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &SavedDocument) -> BoxFuture<'_, StorageResult<()>> {
        let prepared = self.path_for(id).and_then(|path| {
            document.validate(id)?;
            let json = document
                .to_json()
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            Ok((path, json))
        });
        let id = id.to_string();
        let pages = document.page_count();
        let attachments = document.attachment_count();
        Box::pin(async move {
            let (path, json) = prepared?;
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            log::info!(
                "Saved {} ({} attachments on {} pages) to {}",
                id,
                attachments,
                pages,
                path.display()
            );
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SavedDocument>> {
        let path = self.path_for(id);
        let id = id.to_string();
        Box::pin(async move {
            let document = read_document(&id, &path?)?;
            log::info!("Loaded {} ({} attachments)", id, document.attachment_count());
            Ok(document)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(id);
        Box::pin(async move {
            let path = path?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.base_path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", self.base_path.display(), e))
            })?;
            let mut ids: Vec<String> = entries
                .flatten()
                .filter_map(|entry| id_from_path(&entry.path()))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.path_for(id);
        Box::pin(async move { Ok(path?.is_file()) })
    }
}
