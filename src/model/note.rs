//! Footnotes and endnotes.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// Identity of a footnote or endnote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub i64);

/// Role of a note definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A regular note referenced from body text
    #[default]
    Normal,
    /// The separator line above notes
    Separator,
    /// The separator for notes continued from a previous page
    ContinuationSeparator,
    /// Notice shown when notes continue on the next page
    ContinuationNotice,
}

/// A footnote or endnote definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note id
    pub id: NoteId,

    /// Note role
    pub kind: NoteKind,

    /// Note body
    pub content: Vec<Paragraph>,
}

impl Note {
    /// Create a normal note with a text body.
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id: NoteId(id),
            kind: NoteKind::Normal,
            content: vec![Paragraph::with_text(text)],
        }
    }

    /// Create a separator pseudo-note.
    pub fn separator(id: i64, kind: NoteKind) -> Self {
        Self {
            id: NoteId(id),
            kind,
            content: Vec::new(),
        }
    }

    /// Check if the note is a regular, referenced note.
    pub fn is_normal(&self) -> bool {
        self.kind == NoteKind::Normal
    }
}
