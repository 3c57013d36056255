//! Recorded session scripts.

use kurbo::Size;
use pagepin_core::{AttachmentId, DragEvent, ImageSource, Placement, StaticDocument, StaticPlacements};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One page of the scripted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

/// A scripted user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Add a text attachment at a canonical point, optionally committing content.
    AddText {
        page: usize,
        x: f64,
        y: f64,
        #[serde(default)]
        content: Option<String>,
    },
    /// Add an image from a source reference or a local file.
    AddImage {
        page: usize,
        x: f64,
        y: f64,
        #[serde(default)]
        source: Option<ImageSource>,
        #[serde(default)]
        file: Option<PathBuf>,
        natural_width: u32,
        natural_height: u32,
    },
    /// Feed drag events for the active page.
    Drag { events: Vec<DragEvent> },
    /// Enter edit mode, replace the content and blur.
    Edit { id: AttachmentId, content: String },
    /// Remove an attachment; the page is looked up when omitted.
    Remove {
        id: AttachmentId,
        #[serde(default)]
        page: Option<usize>,
    },
    GotoPage { page: usize },
    Zoom { scale: f64 },
}

/// A document plus the actions performed on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub pages: Vec<ScriptPage>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn document(&self) -> StaticDocument {
        StaticDocument::new(self.pages.iter().map(|p| Size::new(p.width, p.height)).collect())
    }

    pub fn placements(&self) -> StaticPlacements {
        StaticPlacements::new(self.pages.iter().map(|p| p.placements.clone()).collect())
    }
}
