//! Structural cleanup passes run around stamping.

use crate::config::StampConfig;
use crate::model::{for_each_paragraph_mut, Block, Document, InlineContent, NoteId, Paragraph, RunContent, RunStyle};
use std::collections::HashSet;

/// Which cleanup passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Merge neighbouring runs with identical formatting
    pub merge_similar_runs: bool,

    /// Clear language tags and proofing marks
    pub strip_language: bool,

    /// Remove footnotes and endnotes nobody references
    pub remove_orphan_notes: bool,
}

impl CleanupOptions {
    /// Options taken from a stamping configuration.
    pub fn from_config(config: &StampConfig) -> Self {
        Self {
            merge_similar_runs: config.merge_similar_runs,
            strip_language: config.strip_language,
            remove_orphan_notes: config.remove_orphan_notes,
        }
    }

    /// Run every pass.
    pub fn all() -> Self {
        Self {
            merge_similar_runs: true,
            strip_language: true,
            remove_orphan_notes: true,
        }
    }

    /// Run no pass.
    pub fn none() -> Self {
        Self {
            merge_similar_runs: false,
            strip_language: false,
            remove_orphan_notes: false,
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct CleanupPipeline {
    options: CleanupOptions,
}

impl CleanupPipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    /// Passes run before placeholders are scanned. Returns the number of
    /// runs merged away.
    pub fn prepare(&self, doc: &mut Document) -> usize {
        // Language first: it can make neighbouring run styles equal
        if self.options.strip_language {
            strip_language(doc);
        }

        let mut merged = 0;
        if self.options.merge_similar_runs {
            for_each_paragraph_mut(&mut doc.body, &mut |para: &mut Paragraph| {
                merged += merge_similar_runs(para);
            });
        }
        merged
    }

    /// Passes run after every edit is committed. Returns the number of
    /// notes removed.
    pub fn finish(&self, doc: &mut Document) -> usize {
        if self.options.remove_orphan_notes {
            remove_orphan_notes(doc)
        } else {
            0
        }
    }
}

/// Merge consecutive sibling runs whose styles are equal into the first of
/// them. Returns the number of runs removed.
pub fn merge_similar_runs(para: &mut Paragraph) -> usize {
    let before = para.content.len();
    let mut merged: Vec<InlineContent> = Vec::with_capacity(before);

    for item in para.content.drain(..) {
        let item = match (merged.last_mut(), item) {
            (Some(InlineContent::Run(last)), InlineContent::Run(run)) if last.style == run.style => {
                for content in run.content {
                    let content = match (last.content.last_mut(), content) {
                        (Some(RunContent::Text(head)), RunContent::Text(tail)) => {
                            head.push_str(&tail);
                            continue;
                        }
                        (_, content) => content,
                    };
                    last.content.push(content);
                }
                continue;
            }
            (_, item) => item,
        };
        merged.push(item);
    }

    para.content = merged;
    before - para.content.len()
}

/// Clear language metadata on run and paragraph-mark formatting, and drop
/// proofing marks.
pub fn strip_language(doc: &mut Document) {
    for_each_paragraph_mut(&mut doc.body, &mut strip_paragraph_language);
    for note in doc.footnotes.iter_mut().chain(doc.endnotes.iter_mut()) {
        for para in &mut note.content {
            strip_paragraph_language(para);
        }
    }
}

fn strip_paragraph_language(para: &mut Paragraph) {
    if para.style.mark_style.lang.is_some() {
        para.style.mark_style = without_lang(&para.style.mark_style);
    }
    para.content.retain(|item| !matches!(item, InlineContent::ProofError(_)));
    for run in para.runs_mut() {
        if run.style.lang.is_some() {
            run.style = without_lang(&run.style);
        }
    }
}

fn without_lang(style: &RunStyle) -> RunStyle {
    RunStyle {
        lang: None,
        ..style.clone()
    }
}

/// Remove normal footnotes and endnotes whose id is never referenced from
/// the body. Separator notes are always kept. Returns the number removed.
pub fn remove_orphan_notes(doc: &mut Document) -> usize {
    let mut footnote_refs = HashSet::new();
    let mut endnote_refs = HashSet::new();
    collect_note_references(&doc.body, &mut footnote_refs, &mut endnote_refs);

    let before = doc.footnotes.len() + doc.endnotes.len();
    doc.footnotes
        .retain(|note| !note.is_normal() || footnote_refs.contains(&note.id));
    doc.endnotes
        .retain(|note| !note.is_normal() || endnote_refs.contains(&note.id));
    let removed = before - doc.footnotes.len() - doc.endnotes.len();

    if removed > 0 {
        log::debug!("removed {} orphaned notes", removed);
    }
    removed
}

fn collect_note_references(blocks: &[Block], footnotes: &mut HashSet<NoteId>, endnotes: &mut HashSet<NoteId>) {
    for block in blocks {
        match block {
            Block::Paragraph(para) => {
                for item in para.runs().flat_map(|run| run.content.iter()) {
                    match item {
                        RunContent::FootnoteReference(id) => {
                            footnotes.insert(*id);
                        }
                        RunContent::EndnoteReference(id) => {
                            endnotes.insert(*id);
                        }
                        _ => {}
                    }
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| row.cells.iter()) {
                    collect_note_references(&cell.content, footnotes, endnotes);
                }
            }
        }
    }
}
