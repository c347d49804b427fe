//! Node identity and positional context.
//!
//! Nodes own their children top-down only. Anything that needs to refer to a
//! parent or to a node scheduled for later editing holds a [`NodeId`] and
//! resolves it through the [`Document`](super::Document) when needed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a paragraph, table or table row within one document.
///
/// Ids are assigned by [`Document::assign_ids`](super::Document::assign_ids)
/// and are not serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Id of a node that has not been numbered yet.
    pub const UNASSIGNED: NodeId = NodeId(0);

    /// Check if the id was assigned by a document.
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index path to a block: `[block]` at top level, then `[row, cell, block]`
/// for every table the block is nested in.
pub type BlockPath = Vec<usize>;

/// The table cell enclosing a visited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    /// Enclosing table
    pub table: NodeId,
    /// Enclosing row
    pub row: NodeId,
    /// Cell index within the row
    pub cell: usize,
}

/// Ancestor chain of the block currently being visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    cells: Vec<CellPosition>,
}

impl Position {
    /// Create a top-level position.
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost enclosing cell, if the block is inside a table.
    pub fn cell(&self) -> Option<&CellPosition> {
        self.cells.last()
    }

    /// Table nesting depth (0 = top level).
    pub fn depth(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn push(&mut self, cell: CellPosition) {
        self.cells.push(cell);
    }

    pub(crate) fn pop(&mut self) {
        self.cells.pop();
    }
}
