//! Applies a script to an editor.

use crate::script::{Action, Script};
use kurbo::Point;
use pagepin_core::{DragOutcome, Editor, EditorError, ImageSource};
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Loading document {name}: {source}")]
    Load {
        name: String,
        #[source]
        source: EditorError,
    },
    #[error("Action {index}: {source}")]
    Editor {
        index: usize,
        #[source]
        source: EditorError,
    },
    #[error("Action {index}: {message}")]
    Image { index: usize, message: String },
    #[error("Action {index}: attachment {id} not found")]
    UnknownAttachment { index: usize, id: String },
}

/// Counts gathered while replaying.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub actions: usize,
    pub commits: usize,
    pub cancels: usize,
    pub clicks: usize,
}

/// Load the script's document into `editor` and apply every action in order.
pub fn replay(editor: &mut Editor, script: &Script) -> Result<ReplaySummary, ReplayError> {
    editor
        .load_document(script.name.clone(), &script.document(), &script.placements())
        .map_err(|source| ReplayError::Load {
            name: script.name.clone(),
            source,
        })?;

    let mut summary = ReplaySummary::default();
    for (index, action) in script.actions.iter().enumerate() {
        log::debug!("Action {}: {:?}", index, action);
        apply(editor, action, index, &mut summary)?;
        summary.actions += 1;
    }
    log::info!(
        "Replayed {} actions ({} drops committed, {} cancelled)",
        summary.actions,
        summary.commits,
        summary.cancels
    );
    Ok(summary)
}

fn apply(editor: &mut Editor, action: &Action, index: usize, summary: &mut ReplaySummary) -> Result<(), ReplayError> {
    let wrap = |source: EditorError| ReplayError::Editor { index, source };

    match action {
        Action::AddText { page, x, y, content } => {
            let id = editor.add_text(*page, Point::new(*x, *y)).map_err(wrap)?;
            if let Some(content) = content {
                // Editing works on the active page
                let previous = editor.active_page();
                editor.set_active_page(*page);
                editor.begin_edit(&id).map_err(wrap)?;
                editor.edit_text(content.clone());
                editor.finish_edit().map_err(wrap)?;
                editor.set_active_page(previous);
            }
        }
        Action::AddImage {
            page,
            x,
            y,
            source,
            file,
            natural_width,
            natural_height,
        } => {
            let source = match (source, file) {
                (Some(source), _) => source.clone(),
                (None, Some(path)) => {
                    let bytes = std::fs::read(path).map_err(|e| ReplayError::Image {
                        index,
                        message: format!("Failed to read {}: {}", path.display(), e),
                    })?;
                    ImageSource::from_bytes(&bytes).ok_or_else(|| ReplayError::Image {
                        index,
                        message: format!("Unsupported image format: {}", path.display()),
                    })?
                }
                (None, None) => {
                    return Err(ReplayError::Image {
                        index,
                        message: "add_image needs a source or a file".to_string(),
                    });
                }
            };
            editor
                .add_image(*page, Point::new(*x, *y), source, *natural_width, *natural_height)
                .map_err(wrap)?;
        }
        Action::Drag { events } => {
            for event in events {
                match editor.handle_drag(event.clone()).map_err(wrap)? {
                    DragOutcome::Committed(_) => summary.commits += 1,
                    DragOutcome::Cancelled => summary.cancels += 1,
                    DragOutcome::Click(_) => summary.clicks += 1,
                    _ => {}
                }
            }
        }
        Action::Edit { id, content } => {
            editor.begin_edit(id).map_err(wrap)?;
            editor.edit_text(content.clone());
            editor.finish_edit().map_err(wrap)?;
        }
        Action::Remove { id, page } => {
            let page = page
                .or_else(|| editor.store().locate(id))
                .ok_or_else(|| ReplayError::UnknownAttachment {
                    index,
                    id: id.to_string(),
                })?;
            editor.remove(page, id).map_err(wrap)?;
        }
        Action::GotoPage { page } => {
            editor.set_active_page(*page);
        }
        Action::Zoom { scale } => {
            editor.set_scale(*scale).map_err(wrap)?;
        }
    }
    Ok(())
}
