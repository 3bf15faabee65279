pub mod config;
pub mod editor;
pub mod error;
pub mod hit;
pub mod history;
pub mod input;
pub mod selection;
pub mod services;
pub mod shortcuts;
pub mod sync;
pub mod transform;

pub use config::EditorConfig;
pub use editor::{Editor, EditorView, PageSummary, ThumbnailJob};
pub use error::{EditorError, EditorResult};
pub use hit::{CursorHint, HitTarget};
pub use history::{History, Snapshot};
pub use input::{InputEvent, Modifiers};
pub use selection::{EditMode, Selection, ToolbarState};
pub use services::{
    Clock, ComputedFont, DocumentImager, ExportRequest, FormatCommand, FormatOutcome, Rasterizer,
    RichTextEditor, SystemClock, TextRange,
};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sync::SyncEngine;
pub use transform::{TransformEngine, TransformMode, Viewport};
