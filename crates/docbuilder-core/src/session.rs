//! Editor session: owns the editor state and talks to the template store.
//!
//! The reducer never performs I/O. The session awaits the store first and
//! only then dispatches the command that reflects the outcome; a failed call
//! dispatches nothing.

use crate::block::{
    BlockId, BlockKind, BlockPatch, Page, create_default_block, reserve_z_index_above,
};
use crate::editor::{Command, EditorState};
use crate::geometry::{
    AlignMode, DistributeDirection, MIN_ALIGN_SELECTION, MIN_DISTRIBUTE_SELECTION, align,
    distribute,
};
use crate::store::{StoreResult, TemplateStore};
use crate::template::{
    DocumentData, SourceFile, SourceFileId, SourceFileSummary, SourceUpload, Template,
    TemplateCreate, TemplateId, TemplateSummary, TemplateUpdate, UNTITLED_TEMPLATE,
};
use crate::view::{self, ViewModel};
use kurbo::{Point, Size, Vec2};
use std::sync::Arc;

/// Where new blocks from the palette are placed.
pub const NEW_BLOCK_ORIGIN: Point = Point::new(50.0, 50.0);

/// An editing session over one document.
pub struct EditorSession<S: TemplateStore> {
    state: EditorState,
    store: Arc<S>,
}

impl<S: TemplateStore> EditorSession<S> {
    /// Create a session with an empty document.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            state: EditorState::new(),
            store,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get the read model for rendering.
    pub fn view(&self) -> ViewModel {
        ViewModel::from_state(&self.state)
    }

    /// Page the document is laid out on.
    pub fn page(&self) -> Page {
        Page::default()
    }

    /// Apply a command to the editor state.
    pub fn dispatch(&mut self, command: Command) -> bool {
        self.state.apply(command)
    }

    /// Add a default block of `kind` and select it.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        let block = create_default_block(kind, NEW_BLOCK_ORIGIN.x, NEW_BLOCK_ORIGIN.y);
        let id = block.id.clone();
        self.dispatch(Command::AddBlock(block));
        id
    }

    /// Click on a block (or on empty page with `None`).
    ///
    /// With `add_to_selection` the block is toggled in the multi-selection.
    pub fn select(&mut self, id: Option<BlockId>, add_to_selection: bool) -> bool {
        match id {
            Some(id) if add_to_selection => self.dispatch(Command::ToggleBlockSelection(id)),
            id => self.dispatch(Command::SelectBlock(id)),
        }
    }

    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> bool {
        self.dispatch(Command::UpdateBlock {
            id: id.to_string(),
            updates: patch,
        })
    }

    /// Apply an inspector edit to the primary selection.
    pub fn update_selected(&mut self, patch: BlockPatch) -> bool {
        match self.state.selected_id.clone() {
            Some(id) => self.dispatch(Command::UpdateBlock { id, updates: patch }),
            None => false,
        }
    }

    /// Delete key: removes the whole multi-selection, or the primary block.
    pub fn delete_selected(&mut self) -> bool {
        if self.state.selected_ids.len() > 1 {
            let ids = self.state.selected_ids.clone();
            self.dispatch(Command::DeleteBlocks(ids))
        } else if let Some(id) = self.state.selected_id.clone() {
            self.dispatch(Command::DeleteBlock(id))
        } else {
            false
        }
    }

    /// Pointer drag of a block whose origin was `origin` when the drag began.
    pub fn drag_block(&mut self, id: &str, origin: Point, delta: Vec2) -> bool {
        let command = view::drag_command(id, self.page(), origin, delta, self.state.zoom);
        self.dispatch(command)
    }

    /// Corner resize of a block whose size was `start` when the gesture began.
    pub fn resize_block(&mut self, id: &str, start: Size, delta: Vec2) -> bool {
        let command = view::resize_command(id, start, delta, self.state.zoom);
        self.dispatch(command)
    }

    /// Align the selection; needs at least two selected blocks.
    pub fn align(&mut self, mode: AlignMode) -> bool {
        if self.state.selected_ids.len() < MIN_ALIGN_SELECTION {
            return false;
        }
        let blocks = align(&self.state.blocks, &self.state.selected_ids, mode);
        self.dispatch(Command::SetBlocks(blocks))
    }

    /// Distribute the selection; needs at least three selected blocks.
    pub fn distribute(&mut self, direction: DistributeDirection) -> bool {
        if self.state.selected_ids.len() < MIN_DISTRIBUTE_SELECTION {
            return false;
        }
        let blocks = distribute(&self.state.blocks, &self.state.selected_ids, direction);
        self.dispatch(Command::SetBlocks(blocks))
    }

    pub fn undo(&mut self) -> bool {
        self.dispatch(Command::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.dispatch(Command::Redo)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        self.dispatch(Command::SetZoom(zoom))
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(view::zoom_in(self.state.zoom))
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(view::zoom_out(self.state.zoom))
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        self.dispatch(Command::SetTemplateInfo {
            id: self.state.template_id,
            title: title.into(),
            description: self.state.template_description.clone(),
        })
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        self.dispatch(Command::SetTemplateInfo {
            id: self.state.template_id,
            title: self.state.template_title.clone(),
            description: description.into(),
        })
    }

    /// Start a fresh document.
    ///
    /// Refuses when there are unsaved changes unless `discard_unsaved` is set.
    pub fn new_template(&mut self, discard_unsaved: bool) -> bool {
        if self.state.is_dirty && !discard_unsaved {
            return false;
        }
        self.dispatch(Command::Reset)
    }

    /// Document payload as it is persisted.
    pub fn document_data(&self) -> DocumentData {
        DocumentData {
            blocks: self.state.blocks.clone(),
            zoom: self.state.zoom,
            ..DocumentData::default()
        }
    }

    fn title_for_save(&self) -> String {
        if self.state.template_title.trim().is_empty() {
            UNTITLED_TEMPLATE.to_string()
        } else {
            self.state.template_title.clone()
        }
    }

    /// Save the document, creating the template on first save.
    ///
    /// On failure nothing is dispatched and the document stays dirty.
    pub async fn save(&mut self) -> StoreResult<Template> {
        let title = self.title_for_save();
        let description = self.state.template_description.clone();
        let data = self.document_data();

        let result = match self.state.template_id {
            Some(id) => {
                let payload = TemplateUpdate {
                    title: Some(title),
                    description: Some(description),
                    data: Some(data),
                };
                self.store.update_template(id, payload).await
            }
            None => {
                let payload = TemplateCreate {
                    title,
                    description: Some(description),
                    data,
                };
                self.store.create_template(payload).await
            }
        };

        let template = result.inspect_err(|e| log::warn!("Failed to save template: {}", e))?;
        if self.state.template_id.is_none() {
            self.dispatch(Command::SetTemplateInfo {
                id: Some(template.id),
                title: template.title.clone(),
                description: template.description.clone(),
            });
        }
        self.dispatch(Command::MarkClean);
        log::info!("Saved template {} ({})", template.id, template.title);
        Ok(template)
    }

    /// Replace the document with a stored template.
    pub async fn load_template(&mut self, id: TemplateId) -> StoreResult<()> {
        let template = self
            .store
            .get_template(id)
            .await
            .inspect_err(|e| log::warn!("Failed to load template {}: {}", id, e))?;
        if let Some(max_z) = template.data.blocks.iter().map(|b| b.z_index).max() {
            reserve_z_index_above(max_z);
        }
        log::info!("Loaded template {} ({} blocks)", id, template.data.blocks.len());
        self.dispatch(Command::LoadTemplate(template));
        Ok(())
    }

    /// Upload a source file bound to the current template, if any.
    pub async fn upload_file(&mut self, upload: SourceUpload) -> StoreResult<SourceFile> {
        let name = upload.file_name.clone();
        let file = self
            .store
            .upload_source_file(upload, self.state.template_id)
            .await
            .inspect_err(|e| log::warn!("Failed to upload {}: {}", name, e))?;
        log::info!("Uploaded {} as source file {}", name, file.id);
        Ok(file)
    }

    pub async fn list_templates(&self) -> StoreResult<Vec<TemplateSummary>> {
        self.store.list_templates().await
    }

    /// Delete a stored template.
    ///
    /// Deleting the open template keeps its content; the next save creates a
    /// new template.
    pub async fn delete_template(&mut self, id: TemplateId) -> StoreResult<()> {
        self.store
            .delete_template(id)
            .await
            .inspect_err(|e| log::warn!("Failed to delete template {}: {}", id, e))?;
        if self.state.template_id == Some(id) {
            self.dispatch(Command::SetTemplateInfo {
                id: None,
                title: self.state.template_title.clone(),
                description: self.state.template_description.clone(),
            });
        }
        Ok(())
    }

    pub async fn list_source_files(&self) -> StoreResult<Vec<SourceFileSummary>> {
        self.store.list_source_files().await
    }

    pub async fn get_source_file(&self, id: SourceFileId) -> StoreResult<SourceFile> {
        self.store.get_source_file(id).await
    }

    pub async fn delete_source_file(&self, id: SourceFileId) -> StoreResult<()> {
        self.store
            .delete_source_file(id)
            .await
            .inspect_err(|e| log::warn!("Failed to delete source file {}: {}", id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoxFuture, MemoryStore, StoreError, block_on};

    fn session() -> EditorSession<MemoryStore> {
        EditorSession::new(Arc::new(MemoryStore::new()))
    }

    /// Store whose every call fails as if the server were down.
    struct DownStore;

    impl TemplateStore for DownStore {
        fn list_templates(&self) -> BoxFuture<'_, StoreResult<Vec<TemplateSummary>>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn get_template(&self, _: TemplateId) -> BoxFuture<'_, StoreResult<Template>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn create_template(&self, _: TemplateCreate) -> BoxFuture<'_, StoreResult<Template>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn update_template(
            &self,
            _: TemplateId,
            _: TemplateUpdate,
        ) -> BoxFuture<'_, StoreResult<Template>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn delete_template(&self, _: TemplateId) -> BoxFuture<'_, StoreResult<()>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn list_source_files(&self) -> BoxFuture<'_, StoreResult<Vec<SourceFileSummary>>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn get_source_file(&self, _: SourceFileId) -> BoxFuture<'_, StoreResult<SourceFile>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn upload_source_file(
            &self,
            _: SourceUpload,
            _: Option<TemplateId>,
        ) -> BoxFuture<'_, StoreResult<SourceFile>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
        fn delete_source_file(&self, _: SourceFileId) -> BoxFuture<'_, StoreResult<()>> {
            Box::pin(async { Err(StoreError::Unreachable) })
        }
    }

    #[test]
    fn test_first_save_creates_template() {
        let mut session = session();
        session.add_block(BlockKind::Text);
        assert!(session.state().is_dirty);

        let saved = block_on(session.save()).unwrap();
        assert_eq!(saved.title, UNTITLED_TEMPLATE);
        assert_eq!(saved.data.page(), Page::default());
        assert_eq!(saved.data.blocks.len(), 1);

        let state = session.state();
        assert_eq!(state.template_id, Some(saved.id));
        assert_eq!(state.template_title, UNTITLED_TEMPLATE);
        assert!(!state.is_dirty);
    }

    #[test]
    fn test_second_save_updates() {
        let mut session = session();
        session.set_title("Акт");
        let first = block_on(session.save()).unwrap();
        session.add_block(BlockKind::Signature);
        session.set_description("Акт сверки");
        let second = block_on(session.save()).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Акт");
        assert_eq!(second.description, "Акт сверки");
        assert_eq!(second.data.blocks.len(), 1);
        assert_eq!(block_on(session.list_templates()).unwrap().len(), 1);
        assert!(!session.state().is_dirty);
    }

    #[test]
    fn test_failed_save_keeps_dirty() {
        let mut session = EditorSession::new(Arc::new(DownStore));
        session.add_block(BlockKind::Text);
        let err = block_on(session.save()).unwrap_err();
        assert_eq!(err.to_string(), "server unreachable");
        assert!(session.state().is_dirty);
        assert_eq!(session.state().template_id, None);
        assert!(block_on(session.load_template(1)).is_err());
        assert_eq!(session.state().blocks.len(), 1);
    }

    #[test]
    fn test_load_replaces_document() {
        let mut session = session();
        let id = session.add_block(BlockKind::Table);
        session.set_zoom(150.0);
        let saved = block_on(session.save()).unwrap();

        let mut other = EditorSession::new(Arc::clone(session.store()));
        other.add_block(BlockKind::Text);
        block_on(other.load_template(saved.id)).unwrap();
        let state = other.state();
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.blocks[0].id, id);
        assert_eq!(state.zoom, 150.0);
        assert!(!state.is_dirty);
        assert!(!state.can_undo());
        assert_eq!(state.template_id, Some(saved.id));

        let new_id = other.add_block(BlockKind::Text);
        let new_z = other.state().block(&new_id).unwrap().z_index;
        assert!(new_z > other.state().block(&id).unwrap().z_index);
    }

    #[test]
    fn test_upload_bound_to_current_template() {
        let mut session = session();
        let loose = block_on(session.upload_file(SourceUpload::new("a.pdf", vec![1]))).unwrap();
        assert_eq!(loose.template, None);

        let saved = block_on(session.save()).unwrap();
        let bound = block_on(session.upload_file(SourceUpload::new("b.docx", vec![1]))).unwrap();
        assert_eq!(bound.template, Some(saved.id));

        let files = block_on(session.list_source_files()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, bound.id);
        let full = block_on(session.get_source_file(loose.id)).unwrap();
        assert_eq!(full.original_name, "a.pdf");
        block_on(session.delete_source_file(loose.id)).unwrap();
        assert_eq!(block_on(session.list_source_files()).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_open_template_detaches_document() {
        let mut session = session();
        session.add_block(BlockKind::Text);
        let saved = block_on(session.save()).unwrap();
        block_on(session.delete_template(saved.id)).unwrap();
        assert_eq!(session.state().template_id, None);
        assert_eq!(session.state().blocks.len(), 1);
        let again = block_on(session.save()).unwrap();
        assert_ne!(again.id, saved.id);
    }

    #[test]
    fn test_new_template_guard() {
        let mut session = session();
        session.add_block(BlockKind::Text);
        assert!(!session.new_template(false));
        assert_eq!(session.state().blocks.len(), 1);
        assert!(session.new_template(true));
        assert_eq!(session.state(), &EditorState::new());
        assert!(session.new_template(false));
    }

    #[test]
    fn test_delete_selected() {
        let mut session = session();
        let a = session.add_block(BlockKind::Text);
        let b = session.add_block(BlockKind::Text);
        let c = session.add_block(BlockKind::Text);
        session.select(Some(a.clone()), false);
        session.select(Some(b.clone()), true);
        assert!(session.delete_selected());
        assert_eq!(session.state().blocks.len(), 1);
        assert!(session.state().selected_ids.is_empty());

        session.select(Some(c.clone()), false);
        assert!(session.delete_selected());
        assert!(session.state().blocks.is_empty());
        assert!(!session.delete_selected());
    }

    #[test]
    fn test_update_selected_targets_primary() {
        let mut session = session();
        assert!(!session.update_selected(BlockPatch::content("x")));
        let a = session.add_block(BlockKind::Text);
        let b = session.add_block(BlockKind::Text);
        session.select(Some(a.clone()), false);
        session.select(Some(b.clone()), true);
        session.update_selected(BlockPatch::content("first"));
        assert_eq!(session.state().block(&a).unwrap().content, "first");
        assert_ne!(session.state().block(&b).unwrap().content, "first");
    }

    #[test]
    fn test_align_and_distribute_gated_by_selection() {
        let mut session = session();
        let a = session.add_block(BlockKind::Rectangle);
        let b = session.add_block(BlockKind::Rectangle);
        let c = session.add_block(BlockKind::Rectangle);
        session.update_block(&b, BlockPatch::position(300.0, 200.0));
        session.update_block(&c, BlockPatch::position(100.0, 400.0));

        session.select(Some(a.clone()), false);
        let index = session.state().history_index();
        assert!(!session.align(AlignMode::Left));
        assert_eq!(session.state().history_index(), index);

        session.select(Some(b.clone()), true);
        assert!(!session.distribute(DistributeDirection::Vertical));
        assert!(session.align(AlignMode::Top));
        assert_eq!(session.state().block(&b).unwrap().y, 50.0);

        session.select(Some(c.clone()), true);
        assert!(session.distribute(DistributeDirection::Horizontal));
        assert_eq!(session.state().history_index(), index + 2);
    }

    #[test]
    fn test_drag_and_resize_respect_zoom() {
        let mut session = session();
        let id = session.add_block(BlockKind::Rectangle);
        session.set_zoom(200.0);
        session.drag_block(&id, NEW_BLOCK_ORIGIN, Vec2::new(100.0, -200.0));
        let block = session.state().block(&id).unwrap();
        assert_eq!((block.x, block.y), (100.0, 0.0));

        session.resize_block(&id, Size::new(150.0, 100.0), Vec2::new(-400.0, 40.0));
        let block = session.state().block(&id).unwrap();
        assert_eq!((block.width, block.height), (50.0, 120.0));
    }

    #[test]
    fn test_zoom_buttons() {
        let mut session = session();
        session.zoom_in();
        assert_eq!(session.state().zoom, 110.0);
        for _ in 0..20 {
            session.zoom_out();
        }
        assert_eq!(session.state().zoom, 50.0);
        assert!(!session.zoom_out());
        assert!(!session.state().is_dirty);
    }

    #[test]
    fn test_undo_redo_through_session() {
        let mut session = session();
        session.add_block(BlockKind::Image);
        assert!(session.undo());
        assert!(session.state().blocks.is_empty());
        assert!(session.redo());
        assert_eq!(session.view().blocks.len(), 1);
    }
}
