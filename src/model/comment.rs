//! Reviewer comments.

use super::Paragraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a comment, shared by its anchors in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comment {}", self.0)
    }
}

/// A comment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id
    pub id: CommentId,

    /// Author name
    pub author: Option<String>,

    /// Comment body
    pub content: Vec<Paragraph>,

    /// Comment this one replies to
    pub parent: Option<CommentId>,
}

impl Comment {
    /// Create a comment with a single-paragraph body.
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id: CommentId(id),
            author: None,
            content: vec![Paragraph::with_text(text)],
            parent: None,
        }
    }

    /// Set the parent comment and return self.
    pub fn reply_to(mut self, parent: CommentId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Body text, one line per paragraph.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
