//! Document Builder Core Library
//!
//! Renderer-agnostic editor state for page templates: blocks, the command
//! reducer with undo/redo, align and distribute, and the template store
//! abstraction used to persist documents.

pub mod block;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod session;
pub mod store;
pub mod template;
pub mod view;

pub use block::{
    Block, BlockId, BlockKind, BlockPatch, BlockStyle, Page, TableData, create_default_block,
};
pub use editor::{Command, EditorState, reduce};
pub use geometry::{AlignMode, DistributeDirection, align, bounding_box, distribute};
pub use history::{History, Snapshot, MAX_HISTORY};
pub use session::EditorSession;
pub use store::{MemoryStore, StoreError, StoreResult, TemplateStore};
pub use template::{DocumentData, SourceFile, SourceUpload, Template, TemplateId};
pub use view::ViewModel;
