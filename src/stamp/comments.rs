//! Comment range discovery and removal.

use crate::model::{
    for_each_paragraph, for_each_paragraph_mut, Block, BlockPath, CommentId, Document, InlineContent, NodeId,
    Paragraph, SectionProperties,
};
use std::collections::{HashMap, HashSet};

/// A comment anchored in the body, with the sibling blocks it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRange {
    /// Comment id
    pub id: CommentId,

    /// Comment body text
    pub text: String,

    /// Parent comment, for replies
    pub parent: Option<CommentId>,

    /// Paragraph holding the range start
    pub start: NodeId,

    /// Paragraph holding the range end
    pub end: NodeId,

    /// Consecutive sibling blocks covered by the range, in order
    pub blocks: Vec<NodeId>,

    /// Section break carried by the block right before the range
    pub preceding_section_break: Option<SectionProperties>,

    /// Number of covered paragraphs that end a section
    pub section_break_count: usize,

    /// Start and end sit in one paragraph with text runs between them
    pub run_anchored: bool,
}

impl CommentRange {
    /// Check if the range closes an odd number of sections.
    pub fn has_odd_section_breaks(&self) -> bool {
        self.section_break_count % 2 == 1
    }

    /// Ids of every paragraph inside the covered blocks, nested ones
    /// included.
    pub fn paragraph_ids(&self, doc: &Document) -> HashSet<NodeId> {
        let mut ids = HashSet::new();
        for block_id in &self.blocks {
            let Some(block) = doc.locate(*block_id).and_then(|path| doc.block(&path)) else {
                continue;
            };
            for_each_paragraph(std::slice::from_ref(block), |para, _| {
                ids.insert(para.id);
            });
        }
        ids
    }
}

/// Find every comment anchored in the body, in document order of the range
/// starts. Anchors without a comment definition are ignored.
pub fn collect_comment_ranges(doc: &Document) -> Vec<CommentRange> {
    let mut starts: Vec<(CommentId, NodeId, BlockPath)> = Vec::new();
    let mut ends: HashMap<CommentId, (NodeId, BlockPath)> = HashMap::new();
    let mut run_anchored: HashSet<CommentId> = HashSet::new();

    for_each_paragraph(&doc.body, |para, path| {
        for item in &para.content {
            match item {
                InlineContent::CommentRangeStart(id) => starts.push((*id, para.id, path.clone())),
                InlineContent::CommentRangeEnd(id) => {
                    ends.insert(*id, (para.id, path.clone()));
                }
                _ => {}
            }
        }
        run_anchored.extend(run_anchored_comments(para));
    });

    let mut ranges = Vec::with_capacity(starts.len());
    for (id, start, start_path) in starts {
        let Some(comment) = doc.comment(id) else {
            log::warn!("{} is anchored in the body but has no definition", id);
            continue;
        };
        let (end, end_path) = ends.get(&id).cloned().unwrap_or_else(|| (start, start_path.clone()));

        let depth = common_container_depth(&start_path, &end_path);
        let prefix = &start_path[..depth];
        let (first, last) = {
            let a = start_path[depth];
            let b = end_path[depth];
            (a.min(b), a.max(b))
        };
        let Some(siblings) = doc.blocks_at(prefix) else {
            continue;
        };
        let covered = &siblings[first..=last.min(siblings.len() - 1)];

        let preceding_section_break = first
            .checked_sub(1)
            .and_then(|i| siblings.get(i))
            .and_then(Block::as_paragraph)
            .and_then(|p| p.style.section_break.clone());

        let section_break_count = covered
            .iter()
            .filter_map(Block::as_paragraph)
            .filter(|p| p.has_section_break())
            .count();

        ranges.push(CommentRange {
            id,
            text: comment.text(),
            parent: comment.parent,
            start,
            end,
            blocks: covered.iter().map(Block::id).collect(),
            preceding_section_break,
            section_break_count,
            run_anchored: start == end && run_anchored.contains(&id),
        });
    }
    ranges
}

/// Length of the longest container path shared by two block paths.
fn common_container_depth(a: &[usize], b: &[usize]) -> usize {
    let mut depth = 0;
    loop {
        let next = depth + 3;
        if next < a.len() && next < b.len() && a[..next] == b[..next] {
            depth = next;
        } else {
            return depth;
        }
    }
}

/// Comments whose start and end markers enclose at least one text run of
/// this paragraph.
fn run_anchored_comments(para: &Paragraph) -> Vec<CommentId> {
    let mut open: HashMap<CommentId, bool> = HashMap::new();
    let mut anchored = Vec::new();
    for item in &para.content {
        match item {
            InlineContent::CommentRangeStart(id) => {
                open.insert(*id, false);
            }
            InlineContent::Run(run) if run.text_len() > 0 => {
                open.values_mut().for_each(|seen| *seen = true);
            }
            InlineContent::CommentRangeEnd(id) => {
                if open.remove(id) == Some(true) {
                    anchored.push(*id);
                }
            }
            _ => {}
        }
    }
    anchored
}

/// Remove every comment anchor from `blocks`.
pub fn strip_comment_anchors(blocks: &mut [Block]) {
    for_each_paragraph_mut(blocks, &mut |para: &mut Paragraph| {
        para.content.retain(|item| item.comment_id().is_none());
    });
}

/// Remove the anchors and definitions of every comment not in `keep`.
/// Replies follow their parent.
pub fn strip_comments(doc: &mut Document, keep: &HashSet<CommentId>) -> usize {
    for_each_paragraph_mut(&mut doc.body, &mut |para: &mut Paragraph| {
        para.content
            .retain(|item| item.comment_id().map_or(true, |id| keep.contains(&id)));
    });

    let before = doc.comments.len();
    doc.comments.retain(|comment| {
        keep.contains(&comment.id) || comment.parent.is_some_and(|parent| keep.contains(&parent))
    });
    before - doc.comments.len()
}
