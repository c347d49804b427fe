//! Document model types.
//!
//! This module defines the tree the stamper rewrites: blocks (paragraphs and
//! tables), runs with their formatting, comment anchors, notes and section
//! properties. Ownership is strictly top-down; cross references are ids.

mod block;
mod comment;
mod document;
mod json;
mod node;
mod note;
mod paragraph;
mod section;
mod table;
mod visit;

pub use block::Block;
pub use comment::{Comment, CommentId};
pub use document::Document;
pub use json::{from_json, to_json, JsonFormat};
pub use node::{BlockPath, CellPosition, NodeId, Position};
pub use note::{Note, NoteId, NoteKind};
pub use paragraph::{
    Alignment, Bias, InlineContent, Paragraph, ParagraphStyle, ProofErrorKind, Run, RunContent,
    RunSpan, RunStyle, VerticalAlign,
};
pub use section::{Orientation, SectionBreakType, SectionProperties};
pub use table::{Table, TableCell, TableRow};
pub use visit::{for_each_paragraph, for_each_paragraph_mut, walk_blocks_mut, BlockVisitor};
