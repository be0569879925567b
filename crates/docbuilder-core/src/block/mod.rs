//! Block definitions for the document page.

mod style;
mod table;

pub use style::{BlockStyle, FontStyle, FontWeight, MAX_FONT_SIZE, MIN_FONT_SIZE, TextAlign};
pub use table::{TableCell, TableData};

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Default page width in layout units (A4 at 96 DPI).
pub const DEFAULT_PAGE_WIDTH: f64 = 794.0;
/// Default page height in layout units (A4 at 96 DPI).
pub const DEFAULT_PAGE_HEIGHT: f64 = 1123.0;
/// Smallest width a block can be resized to.
pub const MIN_BLOCK_WIDTH: f64 = 50.0;
/// Smallest height a block can be resized to.
pub const MIN_BLOCK_HEIGHT: f64 = 30.0;
/// Part of a dragged block that must stay on the page.
pub const DRAG_MARGIN: f64 = 50.0;

/// Unique identifier for blocks.
pub type BlockId = String;

/// The printable sheet blocks are positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            width: DEFAULT_PAGE_WIDTH,
            height: DEFAULT_PAGE_HEIGHT,
        }
    }
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Kind of content a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Table,
    Image,
    Signature,
    Rectangle,
    /// Any kind this build does not know; rendered as a plain box.
    #[serde(other)]
    Unknown,
}

/// A positioned, sized and styled rectangle on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Left edge in page units.
    pub x: f64,
    /// Top edge in page units.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub style: BlockStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Stacking key; larger draws above smaller.
    #[serde(default)]
    pub z_index: i64,
}

impl Block {
    /// Get the block rectangle in page coordinates (rotation ignored).
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

// Process-wide stacking counter. Starts at 1 so freshly created blocks sit
// above blocks deserialized without a zIndex.
static NEXT_Z_INDEX: AtomicI64 = AtomicI64::new(1);

fn next_z_index() -> i64 {
    NEXT_Z_INDEX.fetch_add(1, Ordering::Relaxed)
}

/// Make sure blocks created from now on stack above `z_index`.
pub fn reserve_z_index_above(z_index: i64) {
    NEXT_Z_INDEX.fetch_max(z_index.saturating_add(1), Ordering::Relaxed);
}

/// Generate a fresh block id.
pub fn generate_block_id() -> BlockId {
    format!("block_{}", Uuid::new_v4().simple())
}

/// Create a block of the given kind at `(x, y)` with kind-specific defaults.
///
/// Every call yields a new id and a larger z-index than any earlier call.
pub fn create_default_block(kind: BlockKind, x: f64, y: f64) -> Block {
    let base = Block {
        id: generate_block_id(),
        kind,
        x,
        y,
        width: 200.0,
        height: 100.0,
        rotation: 0.0,
        content: String::new(),
        style: BlockStyle::default_style(),
        table_data: None,
        image_url: None,
        z_index: next_z_index(),
    };

    match kind {
        BlockKind::Text => Block {
            content: "Введите текст...".to_string(),
            width: 200.0,
            height: 60.0,
            ..base
        },
        BlockKind::Table => {
            let mut table = TableData::from_labels([
                ["Ячейка 1", "Ячейка 2"],
                ["Ячейка 3", "Ячейка 4"],
            ]);
            table.header_rows = Some(1);
            Block {
                width: 300.0,
                height: 150.0,
                table_data: Some(table),
                ..base
            }
        }
        BlockKind::Image => Block {
            width: 200.0,
            height: 150.0,
            content: "Изображение".to_string(),
            image_url: Some(String::new()),
            ..base
        },
        BlockKind::Signature => Block {
            content: "Подпись: ________________".to_string(),
            width: 250.0,
            height: 50.0,
            style: BlockStyle {
                border_width: Some(0.0),
                ..BlockStyle::default_style()
            },
            ..base
        },
        BlockKind::Rectangle => Block {
            width: 150.0,
            height: 100.0,
            style: BlockStyle {
                background_color: Some("#f0f0f0".to_string()),
                border_width: Some(2.0),
                ..BlockStyle::default_style()
            },
            ..base
        },
        BlockKind::Unknown => base,
    }
}

/// Shallow partial update of a block.
///
/// `id` and `kind` are immutable and therefore absent. A present `style`
/// replaces the block style wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
}

impl BlockPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn style(style: BlockStyle) -> Self {
        Self {
            style: Some(style),
            ..Default::default()
        }
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the present fields into `block`.
    pub fn apply_to(&self, block: &mut Block) {
        if let Some(x) = self.x {
            block.x = x;
        }
        if let Some(y) = self.y {
            block.y = y;
        }
        if let Some(width) = self.width {
            block.width = width;
        }
        if let Some(height) = self.height {
            block.height = height;
        }
        if let Some(rotation) = self.rotation {
            block.rotation = rotation;
        }
        if let Some(content) = &self.content {
            block.content = content.clone();
        }
        if let Some(style) = &self.style {
            block.style = style.clone();
        }
        if let Some(table_data) = &self.table_data {
            block.table_data = Some(table_data.clone());
        }
        if let Some(image_url) = &self.image_url {
            block.image_url = Some(image_url.clone());
        }
        if let Some(z_index) = self.z_index {
            block.z_index = z_index;
        }
    }
}
