//! Bounded linear undo/redo history.

use crate::block::Block;
use serde::{Deserialize, Serialize};

/// Maximum number of snapshots kept.
pub const MAX_HISTORY: usize = 50;

/// Default zoom, in percent.
pub const DEFAULT_ZOOM: f64 = 100.0;

/// A snapshot of document content for undo/redo.
///
/// Selection, style defaults and template identity are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    pub zoom: f64,
}

impl Snapshot {
    pub fn new(blocks: Vec<Block>, zoom: f64) -> Self {
        Self { blocks, zoom }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_ZOOM)
    }
}

/// Snapshot list with a single cursor.
///
/// Never empty; the cursor always points at an existing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Snapshot>,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl History {
    /// Create a history holding only `initial`.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    /// Record a new snapshot after the cursor.
    ///
    /// Drops the redo tail, then trims the oldest entries so at most
    /// [`MAX_HISTORY`] remain. The cursor ends on the new snapshot.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        if self.entries.len() > MAX_HISTORY {
            let excess = self.entries.len() - MAX_HISTORY;
            self.entries.drain(..excess);
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back. Returns the snapshot now under the cursor.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward. Returns the snapshot now under the cursor.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> &Snapshot {
        &self.entries[self.index]
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }
}
