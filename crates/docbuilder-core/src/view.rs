//! Read model for renderers and the pointer gesture helpers.

use crate::block::{
    Block, BlockId, BlockPatch, DRAG_MARGIN, MIN_BLOCK_HEIGHT, MIN_BLOCK_WIDTH, Page,
};
use crate::editor::{Command, EditorState, MAX_ZOOM, MIN_ZOOM};
use crate::geometry::{MIN_ALIGN_SELECTION, MIN_DISTRIBUTE_SELECTION};
use kurbo::{Point, Size, Vec2};

/// Zoom change of one toolbar click, in percent.
pub const ZOOM_STEP: f64 = 10.0;

/// Everything a renderer needs, recomputed from an [`EditorState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    /// Blocks in draw order (ascending z-index, ties keep creation order).
    pub blocks: Vec<Block>,
    pub selected_id: Option<BlockId>,
    pub selected_ids: Vec<BlockId>,
    pub zoom: f64,
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_align: bool,
    pub can_distribute: bool,
    pub is_dirty: bool,
}

impl ViewModel {
    pub fn from_state(state: &EditorState) -> Self {
        let mut blocks = state.blocks.clone();
        blocks.sort_by_key(|b| b.z_index);
        Self {
            blocks,
            selected_id: state.selected_id.clone(),
            selected_ids: state.selected_ids.clone(),
            zoom: state.zoom,
            can_undo: state.can_undo(),
            can_redo: state.can_redo(),
            can_align: state.selected_ids.len() >= MIN_ALIGN_SELECTION,
            can_distribute: state.selected_ids.len() >= MIN_DISTRIBUTE_SELECTION,
            is_dirty: state.is_dirty,
        }
    }

    /// Block shown in the inspector; `None` if the selection is dangling.
    pub fn selected_block(&self) -> Option<&Block> {
        let id = self.selected_id.as_deref()?;
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|s| s == id)
    }
}

impl From<&EditorState> for ViewModel {
    fn from(state: &EditorState) -> Self {
        Self::from_state(state)
    }
}

/// Convert a pointer delta in screen pixels to page units.
pub fn screen_to_page(delta: Vec2, zoom: f64) -> Vec2 {
    delta / (zoom / 100.0)
}

/// Keep a dragged block's origin inside `[0, page - margin]` on both axes.
pub fn clamp_drag(page: Page, x: f64, y: f64) -> Point {
    let max_x = (page.width - DRAG_MARGIN).max(0.0);
    let max_y = (page.height - DRAG_MARGIN).max(0.0);
    Point::new(x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}

/// Apply the minimum block size.
pub fn clamp_resize(width: f64, height: f64) -> Size {
    Size::new(width.max(MIN_BLOCK_WIDTH), height.max(MIN_BLOCK_HEIGHT))
}

/// Command for a drag that started with the block origin at `origin`.
///
/// `delta` is the pointer travel in screen pixels since the drag began.
pub fn drag_command(id: &str, page: Page, origin: Point, delta: Vec2, zoom: f64) -> Command {
    let target = origin + screen_to_page(delta, zoom);
    let clamped = clamp_drag(page, target.x, target.y);
    Command::UpdateBlock {
        id: id.to_string(),
        updates: BlockPatch::position(clamped.x, clamped.y),
    }
}

/// Command for a corner resize that started at `start` size.
pub fn resize_command(id: &str, start: Size, delta: Vec2, zoom: f64) -> Command {
    let delta = screen_to_page(delta, zoom);
    let size = clamp_resize(start.width + delta.x, start.height + delta.y);
    Command::UpdateBlock {
        id: id.to_string(),
        updates: BlockPatch::size(size.width, size.height),
    }
}

pub fn zoom_in(zoom: f64) -> f64 {
    (zoom + ZOOM_STEP).min(MAX_ZOOM)
}

pub fn zoom_out(zoom: f64) -> f64 {
    (zoom - ZOOM_STEP).max(MIN_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, create_default_block};

    fn block(id: &str, z_index: i64) -> Block {
        let mut b = create_default_block(BlockKind::Rectangle, 0.0, 0.0);
        b.id = id.to_string();
        b.z_index = z_index;
        b
    }

    #[test]
    fn test_blocks_sorted_by_z_stable() {
        let mut state = EditorState::new();
        state.apply(Command::SetBlocks(vec![
            block("top", 9),
            block("a", 1),
            block("b", 1),
            block("mid", 5),
        ]));
        let view = ViewModel::from_state(&state);
        let order: Vec<&str> = view.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "mid", "top"]);
    }

    #[test]
    fn test_derived_flags() {
        let mut state = EditorState::new();
        let view = ViewModel::from(&state);
        assert!(!view.can_undo && !view.can_redo && !view.can_align && !view.can_distribute);

        state.apply(Command::SetBlocks(vec![block("a", 1), block("b", 2), block("c", 3)]));
        state.apply(Command::SelectBlocks(vec!["a".to_string(), "b".to_string()]));
        let view = ViewModel::from(&state);
        assert!(view.can_undo);
        assert!(view.can_align);
        assert!(!view.can_distribute);
        assert!(view.is_dirty);

        state.apply(Command::ToggleBlockSelection("c".to_string()));
        state.apply(Command::Undo);
        let view = ViewModel::from(&state);
        assert!(view.can_distribute);
        assert!(view.can_redo);
        assert!(!view.can_undo);
    }

    #[test]
    fn test_dangling_selection_has_no_selected_block() {
        let mut state = EditorState::new();
        state.apply(Command::AddBlock(block("a", 1)));
        state.apply(Command::Undo);
        let view = ViewModel::from(&state);
        assert!(view.is_selected("a"));
        assert!(view.selected_block().is_none());
    }

    #[test]
    fn test_screen_to_page_scales_by_zoom() {
        assert_eq!(screen_to_page(Vec2::new(100.0, 50.0), 200.0), Vec2::new(50.0, 25.0));
        assert_eq!(screen_to_page(Vec2::new(100.0, 50.0), 50.0), Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_clamp_drag() {
        let page = Page::default();
        assert_eq!(clamp_drag(page, -20.0, 40.0), Point::new(0.0, 40.0));
        assert_eq!(clamp_drag(page, 900.0, 2000.0), Point::new(744.0, 1073.0));
    }

    #[test]
    fn test_clamp_resize() {
        assert_eq!(clamp_resize(10.0, 10.0), Size::new(50.0, 30.0));
        assert_eq!(clamp_resize(120.0, 64.0), Size::new(120.0, 64.0));
    }

    #[test]
    fn test_drag_and_resize_commands() {
        let command = drag_command(
            "b1",
            Page::default(),
            Point::new(100.0, 100.0),
            Vec2::new(40.0, -400.0),
            200.0,
        );
        assert_eq!(
            command,
            Command::UpdateBlock {
                id: "b1".to_string(),
                updates: BlockPatch::position(120.0, 0.0),
            }
        );

        let command = resize_command("b1", Size::new(100.0, 60.0), Vec2::new(-200.0, 20.0), 100.0);
        assert_eq!(
            command,
            Command::UpdateBlock {
                id: "b1".to_string(),
                updates: BlockPatch::size(50.0, 80.0),
            }
        );
    }

    #[test]
    fn test_zoom_steps() {
        assert_eq!(zoom_in(100.0), 110.0);
        assert_eq!(zoom_in(195.0), 200.0);
        assert_eq!(zoom_out(55.0), 50.0);
        assert_eq!(zoom_out(100.0), 90.0);
    }
}
