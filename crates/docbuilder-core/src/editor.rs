//! Editor state and the command reducer.
//!
//! All edits go through [`EditorState::apply`] (or the pure [`reduce`]). The
//! reducer never fails: commands that refer to unknown blocks, undo/redo at
//! either end of history and similar out-of-domain input leave the state as
//! it was.

use crate::block::{Block, BlockId, BlockPatch};
use crate::history::{DEFAULT_ZOOM, History, Snapshot};
use crate::template::{Template, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Smallest zoom, in percent.
pub const MIN_ZOOM: f64 = 50.0;
/// Largest zoom, in percent.
pub const MAX_ZOOM: f64 = 200.0;

/// Bring a zoom value into `[MIN_ZOOM, MAX_ZOOM]`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        DEFAULT_ZOOM
    }
}

/// The closed set of editor commands.
///
/// Serialized as `{"type": "SET_BLOCKS", "payload": ...}` so command logs can
/// be stored and replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Replace all blocks.
    SetBlocks(Vec<Block>),
    /// Append a block and select it.
    AddBlock(Block),
    /// Shallow-merge a patch into one block.
    UpdateBlock { id: BlockId, updates: BlockPatch },
    /// Pairwise patches: the i-th id receives the i-th patch.
    UpdateBlocks {
        ids: Vec<BlockId>,
        updates: Vec<BlockPatch>,
    },
    DeleteBlock(BlockId),
    DeleteBlocks(Vec<BlockId>),
    /// Select a single block, or clear the selection with `None`.
    SelectBlock(Option<BlockId>),
    SelectBlocks(Vec<BlockId>),
    ToggleBlockSelection(BlockId),
    SetZoom(f64),
    SetTemplateInfo {
        id: Option<TemplateId>,
        title: String,
        description: String,
    },
    LoadTemplate(Template),
    MarkClean,
    Undo,
    Redo,
    Reset,
}

impl Command {
    /// Wire name of the command, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetBlocks(_) => "SET_BLOCKS",
            Command::AddBlock(_) => "ADD_BLOCK",
            Command::UpdateBlock { .. } => "UPDATE_BLOCK",
            Command::UpdateBlocks { .. } => "UPDATE_BLOCKS",
            Command::DeleteBlock(_) => "DELETE_BLOCK",
            Command::DeleteBlocks(_) => "DELETE_BLOCKS",
            Command::SelectBlock(_) => "SELECT_BLOCK",
            Command::SelectBlocks(_) => "SELECT_BLOCKS",
            Command::ToggleBlockSelection(_) => "TOGGLE_BLOCK_SELECTION",
            Command::SetZoom(_) => "SET_ZOOM",
            Command::SetTemplateInfo { .. } => "SET_TEMPLATE_INFO",
            Command::LoadTemplate(_) => "LOAD_TEMPLATE",
            Command::MarkClean => "MARK_CLEAN",
            Command::Undo => "UNDO",
            Command::Redo => "REDO",
            Command::Reset => "RESET",
        }
    }
}

/// Root editor state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    /// Blocks in creation order.
    pub blocks: Vec<Block>,
    /// Primary selection; always the head of `selected_ids`.
    pub selected_id: Option<BlockId>,
    /// Full multi-selection, without duplicates.
    pub selected_ids: Vec<BlockId>,
    /// Zoom in percent.
    pub zoom: f64,
    pub template_id: Option<TemplateId>,
    pub template_title: String,
    pub template_description: String,
    /// Content changed since the last load, reset or confirmed save.
    pub is_dirty: bool,
    pub history: History,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    /// The initial state: empty page, 100% zoom, one empty snapshot.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            selected_id: None,
            selected_ids: Vec::new(),
            zoom: DEFAULT_ZOOM,
            template_id: None,
            template_title: String::new(),
            template_description: String::new(),
            is_dirty: false,
            history: History::default(),
        }
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Get a block by id.
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn contains_block(&self, id: &str) -> bool {
        self.block(id).is_some()
    }

    /// The block under the primary selection.
    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_id.as_deref().and_then(|id| self.block(id))
    }

    /// Apply a command in place.
    ///
    /// Returns true if the state changed.
    pub fn apply(&mut self, command: Command) -> bool {
        log::debug!("dispatch {}", command.name());
        match command {
            Command::SetBlocks(blocks) => {
                self.commit(dedup_blocks(blocks));
                self.prune_selection();
                true
            }
            Command::AddBlock(block) => {
                if self.contains_block(&block.id) {
                    return false;
                }
                let id = block.id.clone();
                let mut blocks = self.blocks.clone();
                blocks.push(block);
                self.commit(blocks);
                self.set_selection(vec![id]);
                true
            }
            Command::UpdateBlock { id, updates } => {
                let Some(index) = self.blocks.iter().position(|b| b.id == id) else {
                    return false;
                };
                let mut blocks = self.blocks.clone();
                updates.apply_to(&mut blocks[index]);
                self.commit(blocks);
                true
            }
            Command::UpdateBlocks { ids, updates } => {
                // Ids pair with patches by position; unpaired entries are ignored.
                // Later entries for the same id win.
                let patches: HashMap<BlockId, BlockPatch> = ids.into_iter().zip(updates).collect();
                if !self.blocks.iter().any(|b| patches.contains_key(&b.id)) {
                    return false;
                }
                let blocks = self
                    .blocks
                    .iter()
                    .map(|block| {
                        let mut block = block.clone();
                        if let Some(patch) = patches.get(&block.id) {
                            patch.apply_to(&mut block);
                        }
                        block
                    })
                    .collect();
                self.commit(blocks);
                true
            }
            Command::DeleteBlock(id) => {
                if !self.contains_block(&id) {
                    return false;
                }
                let blocks = self.blocks.iter().filter(|b| b.id != id).cloned().collect();
                self.commit(blocks);
                let remaining = self.selected_ids.iter().filter(|s| **s != id).cloned().collect();
                self.set_selection(remaining);
                true
            }
            Command::DeleteBlocks(ids) => {
                let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
                if !self.blocks.iter().any(|b| doomed.contains(b.id.as_str())) {
                    return false;
                }
                let blocks = self
                    .blocks
                    .iter()
                    .filter(|b| !doomed.contains(b.id.as_str()))
                    .cloned()
                    .collect();
                self.commit(blocks);
                self.set_selection(Vec::new());
                true
            }
            Command::SelectBlock(None) => self.set_selection(Vec::new()),
            Command::SelectBlock(Some(id)) => {
                if !self.contains_block(&id) {
                    return false;
                }
                self.set_selection(vec![id])
            }
            Command::SelectBlocks(ids) => {
                let mut seen = HashSet::new();
                let ids = ids
                    .into_iter()
                    .filter(|id| self.contains_block(id) && seen.insert(id.clone()))
                    .collect();
                self.set_selection(ids)
            }
            Command::ToggleBlockSelection(id) => {
                let mut ids = self.selected_ids.clone();
                if let Some(pos) = ids.iter().position(|s| *s == id) {
                    ids.remove(pos);
                } else if self.contains_block(&id) {
                    ids.push(id);
                } else {
                    return false;
                }
                self.set_selection(ids)
            }
            Command::SetZoom(zoom) => {
                if !zoom.is_finite() {
                    return false;
                }
                let zoom = clamp_zoom(zoom);
                let changed = zoom != self.zoom;
                self.zoom = zoom;
                changed
            }
            Command::SetTemplateInfo {
                id,
                title,
                description,
            } => {
                self.template_id = id;
                self.template_title = title;
                self.template_description = description;
                true
            }
            Command::LoadTemplate(template) => {
                let data = template.data;
                let zoom = if data.zoom > 0.0 {
                    clamp_zoom(data.zoom)
                } else {
                    DEFAULT_ZOOM
                };
                let blocks = dedup_blocks(data.blocks);
                self.history = History::new(Snapshot::new(blocks.clone(), zoom));
                self.blocks = blocks;
                self.zoom = zoom;
                self.template_id = Some(template.id);
                self.template_title = template.title;
                self.template_description = template.description;
                self.selected_id = None;
                self.selected_ids.clear();
                self.is_dirty = false;
                true
            }
            Command::MarkClean => {
                let changed = self.is_dirty;
                self.is_dirty = false;
                changed
            }
            Command::Undo => match self.history.undo() {
                Some(snapshot) => {
                    self.blocks = snapshot.blocks.clone();
                    self.zoom = snapshot.zoom;
                    self.is_dirty = true;
                    true
                }
                None => false,
            },
            Command::Redo => match self.history.redo() {
                Some(snapshot) => {
                    self.blocks = snapshot.blocks.clone();
                    self.zoom = snapshot.zoom;
                    self.is_dirty = true;
                    true
                }
                None => false,
            },
            Command::Reset => {
                *self = Self::new();
                true
            }
        }
    }

    /// Replace the blocks and record a snapshot.
    fn commit(&mut self, blocks: Vec<Block>) {
        self.history.push(Snapshot::new(blocks.clone(), self.zoom));
        self.blocks = blocks;
        self.is_dirty = true;
    }

    /// Set `selected_ids` and keep `selected_id` on its head.
    fn set_selection(&mut self, ids: Vec<BlockId>) -> bool {
        let head = ids.first().cloned();
        let changed = ids != self.selected_ids || head != self.selected_id;
        self.selected_ids = ids;
        self.selected_id = head;
        changed
    }

    /// Drop selected ids whose block no longer exists.
    fn prune_selection(&mut self) {
        let ids = self
            .selected_ids
            .iter()
            .filter(|id| self.contains_block(id))
            .cloned()
            .collect();
        self.set_selection(ids);
    }
}

/// Keep the first block for every id.
fn dedup_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let mut seen = HashSet::new();
    blocks
        .into_iter()
        .filter(|b| seen.insert(b.id.clone()))
        .collect()
}

/// Pure form of [`EditorState::apply`].
pub fn reduce(state: &EditorState, command: Command) -> EditorState {
    let mut next = state.clone();
    next.apply(command);
    next
}
