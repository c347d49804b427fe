//! Table types.

use super::{Block, NodeId, Paragraph};
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Node identity (assigned by the document)
    #[serde(skip)]
    pub id: NodeId,

    /// Rows in the table
    pub rows: Vec<TableRow>,

    /// Table style id
    pub style_id: Option<String>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            rows: Vec::new(),
            style_id: None,
        }
    }

    /// Create a table from rows.
    pub fn with_rows(rows: impl IntoIterator<Item = TableRow>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            ..Self::new()
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (based on first row).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get plain text representation of the table.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

/// A table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Node identity (assigned by the document)
    #[serde(skip)]
    pub id: NodeId,

    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            cells,
        }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::from_text).collect())
    }

    /// Get plain text representation.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content (paragraphs and nested tables)
    pub content: Vec<Block>,

    /// Number of grid columns this cell spans
    pub grid_span: u8,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Block::Paragraph(Paragraph::with_text(text))])
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        Self::with_content(Vec::new())
    }

    /// Create a cell with blocks.
    pub fn with_content(content: Vec<Block>) -> Self {
        Self {
            content,
            grid_span: 1,
        }
    }

    /// Create a cell holding one paragraph.
    pub fn paragraph(paragraph: Paragraph) -> Self {
        Self::with_content(vec![Block::Paragraph(paragraph)])
    }

    /// Get plain text content.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_table_with_data() {
        let table = Table::with_rows([
            TableRow::from_strings(["Name", "Age"]),
            TableRow::from_strings(["Alice", "30"]),
            TableRow::from_strings(["Bob", "25"]),
        ]);

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.text(), "Name\tAge\nAlice\t30\nBob\t25");
    }

    #[test]
    fn test_cell_text() {
        let cell = TableCell::from_text("Hello");
        assert_eq!(cell.text(), "Hello");
        assert!(!cell.is_empty());
        assert!(TableCell::empty().is_empty());
    }
}
