//! Document traversal.
//!
//! Traversals visit paragraphs in reading order, descending into table cells.
//! The mutable walk hands each paragraph to a [`BlockVisitor`] together with
//! its [`Position`]; visitors may edit the paragraph's own content but never
//! the block structure around it. Structural edits are collected and applied
//! after the walk.
//!
//! # Example
//!
//! ```
//! use docstamp::model::{walk_blocks_mut, BlockVisitor, Block, Paragraph, Position};
//!
//! struct Upper;
//!
//! impl BlockVisitor for Upper {
//!     fn visit_paragraph(&mut self, para: &mut Paragraph, _pos: &Position) -> docstamp::Result<()> {
//!         for run in para.runs_mut() {
//!             let text = run.text().to_uppercase();
//!             run.set_text(text);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut body = vec![Block::from(Paragraph::with_text("hi"))];
//! walk_blocks_mut(&mut body, &mut Upper).unwrap();
//! assert_eq!(body[0].text(), "HI");
//! ```

use super::{Block, BlockPath, CellPosition, Paragraph, Position};
use crate::error::Result;

/// Trait for visiting paragraphs during a mutable walk.
pub trait BlockVisitor {
    /// Called for every paragraph, in reading order.
    ///
    /// # Arguments
    /// * `para` - The paragraph being visited
    /// * `position` - Enclosing table cells, innermost last
    fn visit_paragraph(&mut self, para: &mut Paragraph, position: &Position) -> Result<()>;
}

/// Walk `blocks` and everything nested in them. Stops at the first error.
pub fn walk_blocks_mut<V: BlockVisitor + ?Sized>(blocks: &mut [Block], visitor: &mut V) -> Result<()> {
    let mut position = Position::new();
    walk(blocks, &mut position, visitor)
}

fn walk<V: BlockVisitor + ?Sized>(
    blocks: &mut [Block],
    position: &mut Position,
    visitor: &mut V,
) -> Result<()> {
    for block in blocks {
        match block {
            Block::Paragraph(para) => visitor.visit_paragraph(para, position)?,
            Block::Table(table) => {
                let table_id = table.id;
                for row in &mut table.rows {
                    let row_id = row.id;
                    for (cell_index, cell) in row.cells.iter_mut().enumerate() {
                        position.push(CellPosition {
                            table: table_id,
                            row: row_id,
                            cell: cell_index,
                        });
                        let result = walk(&mut cell.content, position, visitor);
                        position.pop();
                        result?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Call `f` for every paragraph with its path, in reading order.
pub fn for_each_paragraph<'a, F>(blocks: &'a [Block], mut f: F)
where
    F: FnMut(&'a Paragraph, &BlockPath),
{
    let mut path = Vec::new();
    visit_paths(blocks, &mut path, &mut f);
}

fn visit_paths<'a, F>(blocks: &'a [Block], path: &mut BlockPath, f: &mut F)
where
    F: FnMut(&'a Paragraph, &BlockPath),
{
    for (i, block) in blocks.iter().enumerate() {
        path.push(i);
        match block {
            Block::Paragraph(para) => f(para, path),
            Block::Table(table) => {
                for (r, row) in table.rows.iter().enumerate() {
                    for (c, cell) in row.cells.iter().enumerate() {
                        path.push(r);
                        path.push(c);
                        visit_paths(&cell.content, path, f);
                        path.truncate(path.len() - 2);
                    }
                }
            }
        }
        path.pop();
    }
}

/// Call `f` on every paragraph mutably, in reading order.
pub fn for_each_paragraph_mut<F>(blocks: &mut [Block], f: &mut F)
where
    F: FnMut(&mut Paragraph),
{
    for block in blocks {
        match block {
            Block::Paragraph(para) => f(para),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        for_each_paragraph_mut(&mut cell.content, f);
                    }
                }
            }
        }
    }
}
