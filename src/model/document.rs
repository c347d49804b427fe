//! Document-level types.

use super::{Block, BlockPath, Comment, CommentId, NodeId, Note, Paragraph, SectionProperties, Table, TableRow};
use serde::{Deserialize, Serialize};

/// A document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Body content
    pub body: Vec<Block>,

    /// Comment definitions
    pub comments: Vec<Comment>,

    /// Footnote definitions
    pub footnotes: Vec<Note>,

    /// Endnote definitions
    pub endnotes: Vec<Note>,

    /// Properties of the last section
    pub final_section: Option<SectionProperties>,

    #[serde(skip)]
    next_id: u64,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from body blocks, numbering every node.
    pub fn with_body(body: impl IntoIterator<Item = Block>) -> Self {
        let mut doc = Self {
            body: body.into_iter().collect(),
            ..Self::default()
        };
        doc.assign_ids();
        doc
    }

    /// Add a block to the body. The block and its children get fresh ids.
    pub fn add_block(&mut self, block: impl Into<Block>) {
        let mut block = block.into();
        self.renumber(std::slice::from_mut(&mut block));
        self.body.push(block);
    }

    /// Add a comment definition.
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Renumber every node of the document.
    pub fn assign_ids(&mut self) {
        self.next_id = 0;
        let mut body = std::mem::take(&mut self.body);
        self.renumber(&mut body);
        self.body = body;
    }

    /// Give fresh ids to `blocks` and everything nested in them.
    pub fn renumber(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            match block {
                Block::Paragraph(p) => p.id = self.fresh_id(),
                Block::Table(t) => {
                    t.id = self.fresh_id();
                    for row in &mut t.rows {
                        self.renumber_row(row);
                    }
                }
            }
        }
    }

    /// Give fresh ids to a row and everything in its cells.
    pub fn renumber_row(&mut self, row: &mut TableRow) {
        row.id = self.fresh_id();
        for cell in &mut row.cells {
            self.renumber(&mut cell.content);
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    /// Find the path of a paragraph or table.
    pub fn locate(&self, id: NodeId) -> Option<BlockPath> {
        let mut path = Vec::new();
        find_block(&self.body, id, &mut path).then_some(path)
    }

    /// Find a row: path of its table plus the row index.
    pub fn locate_row(&self, id: NodeId) -> Option<(BlockPath, usize)> {
        let mut path = Vec::new();
        find_row(&self.body, id, &mut path)
    }

    /// Get a block by path.
    pub fn block(&self, path: &[usize]) -> Option<&Block> {
        let (last, prefix) = path.split_last()?;
        container(&self.body, prefix)?.get(*last)
    }

    /// Get a block mutably by path.
    pub fn block_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (last, prefix) = path.split_last()?;
        container_mut(&mut self.body, prefix)?.get_mut(*last)
    }

    /// Get the blocks of the container at `prefix` (a block path without
    /// its last index; empty for the body).
    pub fn blocks_at(&self, prefix: &[usize]) -> Option<&[Block]> {
        container(&self.body, prefix)
    }

    /// Get the block list holding the block at `path`.
    pub fn container_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Block>> {
        let (_, prefix) = path.split_last()?;
        container_mut(&mut self.body, prefix)
    }

    /// Get a paragraph by id.
    pub fn paragraph_mut(&mut self, id: NodeId) -> Option<&mut Paragraph> {
        let path = self.locate(id)?;
        self.block_mut(&path)?.as_paragraph_mut()
    }

    /// Get a table by id.
    pub fn table(&self, id: NodeId) -> Option<&Table> {
        let path = self.locate(id)?;
        self.block(&path)?.as_table()
    }

    /// Get a table mutably by id.
    pub fn table_mut(&mut self, id: NodeId) -> Option<&mut Table> {
        let path = self.locate(id)?;
        match self.block_mut(&path)? {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Detach a paragraph or table. Returns `None` if it is no longer in
    /// the tree.
    pub fn remove_block(&mut self, id: NodeId) -> Option<Block> {
        let path = self.locate(id)?;
        let index = *path.last()?;
        Some(self.container_mut(&path)?.remove(index))
    }

    /// Detach a table row. Returns `None` if it is no longer in the tree.
    pub fn remove_row(&mut self, id: NodeId) -> Option<TableRow> {
        let (table_path, index) = self.locate_row(id)?;
        match self.block_mut(&table_path)? {
            Block::Table(t) => Some(t.rows.remove(index)),
            _ => None,
        }
    }

    /// Replace a run of consecutive sibling blocks with `replacement`.
    ///
    /// Returns the removed blocks, or `None` if the ids are no longer
    /// consecutive siblings in the tree.
    pub fn replace_blocks(&mut self, ids: &[NodeId], replacement: Vec<Block>) -> Option<Vec<Block>> {
        let first = *ids.first()?;
        let path = self.locate(first)?;
        let start = *path.last()?;
        let blocks = self.container_mut(&path)?;
        let end = start + ids.len();
        if end > blocks.len() || blocks[start..end].iter().map(Block::id).ne(ids.iter().copied()) {
            return None;
        }
        Some(blocks.splice(start..end, replacement).collect())
    }

    /// Get a comment definition.
    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Check if the document has no body content.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Get plain text content of the body.
    pub fn plain_text(&self) -> String {
        self.body
            .iter()
            .map(|block| block.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Iterate over the top-level paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(Block::as_paragraph)
    }
}

fn find_block(blocks: &[Block], id: NodeId, path: &mut BlockPath) -> bool {
    for (i, block) in blocks.iter().enumerate() {
        path.push(i);
        if block.id() == id {
            return true;
        }
        if let Block::Table(table) = block {
            for (r, row) in table.rows.iter().enumerate() {
                for (c, cell) in row.cells.iter().enumerate() {
                    path.push(r);
                    path.push(c);
                    if find_block(&cell.content, id, path) {
                        return true;
                    }
                    path.truncate(path.len() - 2);
                }
            }
        }
        path.pop();
    }
    false
}

fn find_row(blocks: &[Block], id: NodeId, path: &mut BlockPath) -> Option<(BlockPath, usize)> {
    for (i, block) in blocks.iter().enumerate() {
        let Block::Table(table) = block else { continue };
        path.push(i);
        if let Some(r) = table.rows.iter().position(|row| row.id == id) {
            return Some((path.clone(), r));
        }
        for (r, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.cells.iter().enumerate() {
                path.push(r);
                path.push(c);
                if let Some(found) = find_row(&cell.content, id, path) {
                    return Some(found);
                }
                path.truncate(path.len() - 2);
            }
        }
        path.pop();
    }
    None
}

fn container<'a>(blocks: &'a [Block], prefix: &[usize]) -> Option<&'a [Block]> {
    match prefix {
        [] => Some(blocks),
        [b, r, c, rest @ ..] => match blocks.get(*b)? {
            Block::Table(t) => container(&t.rows.get(*r)?.cells.get(*c)?.content, rest),
            Block::Paragraph(_) => None,
        },
        _ => None,
    }
}

fn container_mut<'a>(blocks: &'a mut Vec<Block>, prefix: &[usize]) -> Option<&'a mut Vec<Block>> {
    match prefix {
        [] => Some(blocks),
        [b, r, c, rest @ ..] => match blocks.get_mut(*b)? {
            Block::Table(t) => container_mut(&mut t.rows.get_mut(*r)?.cells.get_mut(*c)?.content, rest),
            Block::Paragraph(_) => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableCell, TableRow};

    fn sample() -> Document {
        let table = Table::with_rows([
            TableRow::from_strings(["a", "b"]),
            TableRow::new(vec![TableCell::from_text("c"), TableCell::from_text("d")]),
        ]);
        Document::with_body([
            Block::from(Paragraph::with_text("first")),
            Block::from(table),
            Block::from(Paragraph::with_text("last")),
        ])
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let doc = sample();
        let mut ids = vec![doc.body[0].id(), doc.body[1].id(), doc.body[2].id()];
        let table = doc.body[1].as_table().unwrap();
        for row in &table.rows {
            ids.push(row.id);
            for cell in &row.cells {
                ids.extend(cell.content.iter().map(Block::id));
            }
        }
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert!(ids.iter().all(NodeId::is_assigned));
    }

    #[test]
    fn test_locate_nested_paragraph() {
        let doc = sample();
        let table = doc.body[1].as_table().unwrap();
        let target = table.rows[1].cells[1].content[0].id();

        let path = doc.locate(target).unwrap();
        assert_eq!(path, vec![1, 1, 1, 0]);
        assert_eq!(doc.block(&path).unwrap().text(), "d");
    }

    #[test]
    fn test_remove_row_and_block() {
        let mut doc = sample();
        let table = doc.body[1].as_table().unwrap();
        let row_id = table.rows[0].id;
        let cell_para = table.rows[0].cells[0].content[0].id();
        let table_id = table.id;

        assert!(doc.remove_row(row_id).is_some());
        assert!(doc.remove_row(row_id).is_none());
        assert!(doc.locate(cell_para).is_none());

        assert!(doc.remove_block(table_id).is_some());
        assert_eq!(doc.plain_text(), "first\nlast");
    }

    #[test]
    fn test_replace_blocks() {
        let mut doc = sample();
        let ids = [doc.body[0].id(), doc.body[1].id()];
        let removed = doc
            .replace_blocks(&ids, vec![Block::from(Paragraph::with_text("new"))])
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(doc.plain_text(), "new\nlast");

        // Ids no longer present
        assert!(doc.replace_blocks(&ids, Vec::new()).is_none());
    }

    #[test]
    fn test_add_block_numbers_nodes() {
        let mut doc = sample();
        doc.add_block(Paragraph::with_text("appended"));
        let id = doc.body[3].id();
        assert!(id.is_assigned());
        assert_ne!(id, doc.body[2].id());
    }
}
