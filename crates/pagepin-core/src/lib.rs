//! PagePin Core Library
//!
//! Placement and coordinate-transform engine for text and image attachments
//! overlaid on the pages of a rendered document.
//!
//! Stored geometry is always canonical (document units). The visual scale of a
//! view is passed explicitly into every transform, so several views can share
//! one document at different zoom levels.

pub mod attachment;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod interaction;
pub mod placement;
pub mod source;
pub mod storage;
pub mod store;
pub mod viewport;

pub use attachment::{
    Attachment, AttachmentId, AttachmentKind, AttachmentPatch, FontFamily, GeometryPatch, ImageAttachment,
    ImageFormat, ImageSource, SlotChange, TextAttachment, TextContentPatch, wrap_lines,
};
pub use config::{ConfigError, EditorConfig, TextDefaults};
pub use editor::{Editor, EditorError, EditorResult};
pub use geometry::{FitBound, GeometryError, Scale, clamped_move, scale_to};
pub use interaction::{
    DragEvent, DragOutcome, DragPhase, EditOutcome, InteractionCoordinator, InteractionError, OverlaySnapshot,
    PageView, PointerSample,
};
pub use placement::{Placement, PlacementError, PlacementId, PlacementResolver, Resolution};
pub use source::{
    DocumentSource, IdGenerator, NoPlacements, PlacementProvider, SequentialIds, StaticDocument, StaticPlacements,
    UuidIds,
};
pub use storage::{FileStorage, MemoryStorage, SavedDocument, Storage, StorageError};
pub use store::{AttachmentStore, StoreError, UpdateOutcome};
pub use viewport::Viewport;
