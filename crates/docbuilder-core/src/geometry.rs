//! Align and distribute operations over multi-selections.
//!
//! All functions are pure: they read a block list and a set of selected ids
//! and return a new list of the same length and order. Blocks outside the
//! selection are returned untouched.

use crate::block::{Block, BlockId};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Minimum selection size for [`align`].
pub const MIN_ALIGN_SELECTION: usize = 2;
/// Minimum selection size for [`distribute`].
pub const MIN_DISTRIBUTE_SELECTION: usize = 3;

/// Alignment target inside the selection bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

/// Axis along which [`distribute`] spaces blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributeDirection {
    Horizontal,
    Vertical,
}

fn id_set(ids: &[BlockId]) -> HashSet<&str> {
    ids.iter().map(String::as_str).collect()
}

/// Smallest rectangle enclosing the selected blocks.
///
/// Returns `None` when no block matches `ids`.
pub fn bounding_box(blocks: &[Block], ids: &[BlockId]) -> Option<Rect> {
    let selected = id_set(ids);
    blocks
        .iter()
        .filter(|b| selected.contains(b.id.as_str()))
        .map(Block::rect)
        .reduce(|acc, r| acc.union(r))
}

/// Align the selected blocks against their common bounding box.
///
/// Selections smaller than [`MIN_ALIGN_SELECTION`] leave the list unchanged.
pub fn align(blocks: &[Block], ids: &[BlockId], mode: AlignMode) -> Vec<Block> {
    if ids.len() < MIN_ALIGN_SELECTION {
        return blocks.to_vec();
    }
    let Some(bbox) = bounding_box(blocks, ids) else {
        return blocks.to_vec();
    };
    let selected = id_set(ids);
    let center = bbox.center();

    blocks
        .iter()
        .map(|block| {
            if !selected.contains(block.id.as_str()) {
                return block.clone();
            }
            let mut block = block.clone();
            match mode {
                AlignMode::Left => block.x = bbox.x0,
                AlignMode::Center => block.x = center.x - block.width / 2.0,
                AlignMode::Right => block.x = bbox.x1 - block.width,
                AlignMode::Top => block.y = bbox.y0,
                AlignMode::Middle => block.y = center.y - block.height / 2.0,
                AlignMode::Bottom => block.y = bbox.y1 - block.height,
            }
            block
        })
        .collect()
}

/// Space the selected blocks evenly between the outermost two.
///
/// Blocks are ordered by their leading edge (stable, ties keep list order).
/// The first and last keep their positions; a negative gap is applied as-is,
/// so overlapping selections may move later blocks backwards. Selections
/// smaller than [`MIN_DISTRIBUTE_SELECTION`] leave the list unchanged.
pub fn distribute(blocks: &[Block], ids: &[BlockId], direction: DistributeDirection) -> Vec<Block> {
    if ids.len() < MIN_DISTRIBUTE_SELECTION {
        return blocks.to_vec();
    }
    let selected = id_set(ids);

    // (leading edge, extent) along the distribution axis
    let axis = |b: &Block| match direction {
        DistributeDirection::Horizontal => (b.x, b.width),
        DistributeDirection::Vertical => (b.y, b.height),
    };

    let mut sorted: Vec<&Block> = blocks
        .iter()
        .filter(|b| selected.contains(b.id.as_str()))
        .collect();
    if sorted.len() < 2 {
        return blocks.to_vec();
    }
    sorted.sort_by(|a, b| axis(*a).0.total_cmp(&axis(*b).0));

    let (first_pos, _) = axis(sorted[0]);
    let (last_pos, last_extent) = axis(sorted[sorted.len() - 1]);
    let total_extent: f64 = sorted.iter().map(|b| axis(*b).1).sum();
    let span = last_pos + last_extent - first_pos;
    let gap = (span - total_extent) / (sorted.len() - 1) as f64;

    let mut positions: HashMap<&str, f64> = HashMap::with_capacity(sorted.len());
    let mut cursor = first_pos;
    for block in &sorted {
        positions.insert(block.id.as_str(), cursor);
        cursor += axis(*block).1 + gap;
    }
    // Pin the far end so accumulated rounding never moves it.
    positions.insert(sorted[sorted.len() - 1].id.as_str(), last_pos);

    blocks
        .iter()
        .map(|block| {
            let Some(&pos) = positions.get(block.id.as_str()) else {
                return block.clone();
            };
            let mut block = block.clone();
            match direction {
                DistributeDirection::Horizontal => block.x = pos,
                DistributeDirection::Vertical => block.y = pos,
            }
            block
        })
        .collect()
}
