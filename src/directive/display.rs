//! Conditional removal: `displayParagraphIf`, `displayParagraphIfPresent`,
//! `displayTableRowIf` and `displayTableIf`.

use super::{CommitContext, Directive, DirectiveKind, DirectiveProcessor, DirectiveSignature};
use crate::config::StampConfig;
use crate::error::Result;
use crate::model::{Document, NodeId};
use crate::value::Value;

/// Removes paragraphs, rows and tables whose condition is false.
#[derive(Debug, Default)]
pub struct DisplayIfProcessor {
    paragraphs: Vec<NodeId>,
    rows: Vec<NodeId>,
    tables: Vec<NodeId>,
}

impl DisplayIfProcessor {
    /// Create a processor with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }
}

/// `null` counts as false; anything but a boolean is rejected.
fn condition(directive: &Directive) -> Result<bool> {
    match directive.arg() {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(directive.anchor.bad_argument(&directive.kind, "bool", other)),
    }
}

impl DirectiveProcessor for DisplayIfProcessor {
    fn signatures(&self) -> Vec<DirectiveSignature> {
        vec![
            DirectiveSignature::unary(DirectiveKind::DisplayParagraphIf),
            DirectiveSignature::unary(DirectiveKind::DisplayParagraphIfPresent),
            DirectiveSignature::unary(DirectiveKind::DisplayTableRowIf),
            DirectiveSignature::unary(DirectiveKind::DisplayTableIf),
        ]
    }

    fn apply(&mut self, directive: Directive, _config: &StampConfig) -> Result<()> {
        let anchor = &directive.anchor;
        match &directive.kind {
            DirectiveKind::DisplayParagraphIf => {
                if !condition(&directive)? {
                    self.paragraphs.push(anchor.paragraph);
                }
            }
            DirectiveKind::DisplayParagraphIfPresent => {
                if directive.arg().is_null() {
                    self.paragraphs.push(anchor.paragraph);
                }
            }
            DirectiveKind::DisplayTableRowIf => {
                let cell = anchor
                    .cell
                    .ok_or_else(|| anchor.precondition(&directive.kind, "paragraph is not inside a table cell"))?;
                if !condition(&directive)? {
                    self.rows.push(cell.row);
                }
            }
            DirectiveKind::DisplayTableIf => {
                let cell = anchor
                    .cell
                    .ok_or_else(|| anchor.precondition(&directive.kind, "paragraph is not inside a table"))?;
                if !condition(&directive)? {
                    self.tables.push(cell.table);
                }
            }
            other => log::warn!("{} routed to the display processor", other),
        }
        Ok(())
    }

    fn commit_changes(&mut self, document: &mut Document, context: &mut CommitContext<'_>) -> Result<()> {
        // Paragraphs, then rows, then tables. Nodes already detached by an
        // earlier removal are skipped.
        for id in self.paragraphs.drain(..) {
            match document.remove_block(id) {
                Some(_) => context.report.paragraphs_removed += 1,
                None => log::debug!("paragraph {} already detached", id),
            }
        }
        for id in self.rows.drain(..) {
            match document.remove_row(id) {
                Some(_) => context.report.rows_removed += 1,
                None => log::debug!("row {} already detached", id),
            }
        }
        for id in self.tables.drain(..) {
            match document.remove_block(id) {
                Some(_) => context.report.tables_removed += 1,
                None => log::debug!("table {} already detached", id),
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.paragraphs.clear();
        self.rows.clear();
        self.tables.clear();
    }
}
