//! Paragraph and run-level types.

use super::{CommentId, NodeId, NoteId, SectionProperties};
use serde::{Deserialize, Serialize};

/// A paragraph of inline content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Node identity (assigned by the document)
    #[serde(skip)]
    pub id: NodeId,

    /// Runs and anchors, in reading order
    pub content: Vec<InlineContent>,

    /// Paragraph style
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            content: Vec::new(),
            style: ParagraphStyle::default(),
        }
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a paragraph from runs.
    pub fn with_runs(runs: impl IntoIterator<Item = Run>) -> Self {
        let mut p = Self::new();
        for run in runs {
            p.add_run(run);
        }
        p
    }

    /// Add plain text to the paragraph.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(InlineContent::Run(Run::new(text)));
    }

    /// Add a styled run.
    pub fn add_run(&mut self, run: Run) {
        self.content.push(InlineContent::Run(run));
    }

    /// Add arbitrary inline content.
    pub fn push(&mut self, item: InlineContent) {
        self.content.push(item);
    }

    /// Set a section break on this paragraph and return self.
    pub fn section_break(mut self, section: SectionProperties) -> Self {
        self.style.section_break = Some(section);
        self
    }

    /// Text of all runs, concatenated. Line breaks and other non-text
    /// content do not contribute characters.
    pub fn text(&self) -> String {
        self.runs().map(|run| run.text()).collect()
    }

    /// Iterate over the runs of the paragraph.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| match c {
            InlineContent::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Iterate mutably over the runs of the paragraph.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.content.iter_mut().filter_map(|c| match c {
            InlineContent::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Character spans of each text-bearing run, by content index.
    pub fn run_spans(&self) -> Vec<RunSpan> {
        let mut spans = Vec::new();
        let mut offset = 0;
        for (index, item) in self.content.iter().enumerate() {
            if let InlineContent::Run(run) = item {
                let len = run.text_len();
                if len > 0 {
                    spans.push(RunSpan {
                        index,
                        start: offset,
                        end: offset + len,
                    });
                    offset += len;
                }
            }
        }
        spans
    }

    /// Comments whose range starts in this paragraph.
    pub fn comment_starts(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.content.iter().filter_map(|c| match c {
            InlineContent::CommentRangeStart(id) => Some(*id),
            _ => None,
        })
    }

    /// Check if the paragraph has no text.
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Check if the paragraph ends a section.
    pub fn has_section_break(&self) -> bool {
        self.style.section_break.is_some()
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of a run's text inside the flattened paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSpan {
    /// Index in `Paragraph::content`
    pub index: usize,
    /// Byte offset where the run's text starts
    pub start: usize,
    /// Byte offset where the run's text ends
    pub end: usize,
}

impl RunSpan {
    /// Check if the span covers the byte at `offset`.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InlineContent {
    /// A styled run
    Run(Run),

    /// Start of a comment's anchored range
    CommentRangeStart(CommentId),

    /// End of a comment's anchored range
    CommentRangeEnd(CommentId),

    /// The comment's reference mark
    CommentReference(CommentId),

    /// A spelling or grammar checker mark
    ProofError(ProofErrorKind),
}

impl InlineContent {
    /// The comment this anchor belongs to, if it is a comment anchor.
    pub fn comment_id(&self) -> Option<CommentId> {
        match self {
            InlineContent::CommentRangeStart(id)
            | InlineContent::CommentRangeEnd(id)
            | InlineContent::CommentReference(id) => Some(*id),
            _ => None,
        }
    }
}

/// Kind of proofing mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofErrorKind {
    /// Start of a misspelling
    SpellStart,
    /// End of a misspelling
    SpellEnd,
    /// Start of a grammar issue
    GramStart,
    /// End of a grammar issue
    GramEnd,
}

/// A run of content with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Content items, in order
    pub content: Vec<RunContent>,

    /// Formatting
    pub style: RunStyle,
}

/// Which side keeps zero-width content sitting exactly on a split offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Keep it in the left part
    Left,
    /// Move it to the right part
    Right,
}

impl Run {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content: vec![RunContent::Text(text.into())],
            style: RunStyle::default(),
        }
    }

    /// Create a text run with the given style.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            content: vec![RunContent::Text(text.into())],
            style,
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            RunStyle {
                bold: true,
                ..Default::default()
            },
        )
    }

    /// Create an italic text run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            RunStyle {
                italic: true,
                ..Default::default()
            },
        )
    }

    /// Create a run holding a single line break.
    pub fn line_break() -> Self {
        Self {
            content: vec![RunContent::LineBreak],
            style: RunStyle::default(),
        }
    }

    /// Text content of the run.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                RunContent::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Length in bytes of the run's text.
    pub fn text_len(&self) -> usize {
        self.content
            .iter()
            .map(|c| match c {
                RunContent::Text(s) => s.len(),
                _ => 0,
            })
            .sum()
    }

    /// Replace the content with a single text item.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = vec![RunContent::Text(text.into())];
    }

    /// Check if this run has no content at all.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|c| matches!(c, RunContent::Text(s) if s.is_empty()))
    }

    /// Split the run at a byte offset of its text.
    ///
    /// `self` keeps everything before `at`; the returned run holds the rest
    /// and carries a copy of the same style. `at` must be on a char boundary.
    pub fn split_off(&mut self, at: usize, bias: Bias) -> Run {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut offset = 0;

        for item in self.content.drain(..) {
            match item {
                RunContent::Text(text) => {
                    let end = offset + text.len();
                    if end <= at {
                        left.push(RunContent::Text(text));
                    } else if offset >= at {
                        right.push(RunContent::Text(text));
                    } else {
                        let (head, tail) = text.split_at(at - offset);
                        left.push(RunContent::Text(head.to_string()));
                        right.push(RunContent::Text(tail.to_string()));
                    }
                    offset = end;
                }
                other => {
                    let goes_left = offset < at || (offset == at && bias == Bias::Left);
                    if goes_left {
                        left.push(other);
                    } else {
                        right.push(other);
                    }
                }
            }
        }

        self.content = left;
        Run {
            content: right,
            style: self.style.clone(),
        }
    }
}

/// A content item inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RunContent {
    /// Text
    Text(String),
    /// Line break
    LineBreak,
    /// Tab character
    Tab,
    /// Reference to a footnote
    FootnoteReference(NoteId),
    /// Reference to an endnote
    EndnoteReference(NoteId),
}

/// Run formatting properties. Structural equality decides whether two
/// neighbouring runs may be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunStyle {
    /// Character style id
    pub style_id: Option<String>,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Strikethrough text
    pub strikethrough: bool,

    /// Superscript / subscript
    pub vertical_align: VerticalAlign,

    /// Font name
    pub font_name: Option<String>,

    /// Font size in half-points
    pub font_size: Option<u32>,

    /// Text color (hex format, e.g., "FF0000")
    pub color: Option<String>,

    /// Highlight color
    pub highlight: Option<String>,

    /// Language tag used by proofing tools
    pub lang: Option<String>,
}

impl RunStyle {
    /// Check if any character styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold
            || self.italic
            || self.underline
            || self.strikethrough
            || self.vertical_align != VerticalAlign::Baseline
    }
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Normal text
    #[default]
    Baseline,
    /// Superscript
    Superscript,
    /// Subscript
    Subscript,
}

/// Paragraph styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Paragraph style id
    pub style_id: Option<String>,

    /// Text alignment
    pub alignment: Alignment,

    /// Formatting of the paragraph mark
    pub mark_style: RunStyle,

    /// Section properties, when this paragraph ends a section
    pub section_break: Option<SectionProperties>,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}
