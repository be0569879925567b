//! Table block contents.

use serde::{Deserialize, Serialize};

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
}

impl TableCell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            colspan: None,
            rowspan: None,
        }
    }

    /// Columns covered by this cell (at least 1).
    pub fn colspan(&self) -> u32 {
        self.colspan.unwrap_or(1).max(1)
    }

    /// Rows covered by this cell (at least 1).
    pub fn rowspan(&self) -> u32 {
        self.rowspan.unwrap_or(1).max(1)
    }
}

/// Rows of cells with an optional header prefix.
///
/// Row widths are not validated; malformed tables render best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub rows: Vec<Vec<TableCell>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_rows: Option<u32>,
}

impl TableData {
    /// Build a table from plain cell labels.
    pub fn from_labels<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(TableCell::new).collect())
                .collect(),
            header_rows: None,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest visual row, counting colspans.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.colspan() as usize).sum::<usize>())
            .max()
            .unwrap_or(0)
    }

    /// Whether row `index` belongs to the header prefix.
    pub fn is_header_row(&self, index: usize) -> bool {
        index < self.header_rows.unwrap_or(0) as usize
    }
}
