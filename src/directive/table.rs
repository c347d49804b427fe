//! `resolveTable`: fill a template table from tabular data.
//!
//! The first row of the table receives the headers and the second row is
//! the template for data rows. A table with a single row has no header
//! row; that row is the template.
//!
//! Columns beyond the template row's cells are dropped under the lenient
//! fill policy; the strict policy rejects such a table.

use super::{Anchor, CommitContext, Directive, DirectiveKind, DirectiveProcessor, DirectiveSignature};
use crate::config::{StampConfig, TableFillPolicy};
use crate::error::{Error, Result};
use crate::model::{Block, Document, NodeId, Run, TableCell, TableRow};
use crate::value::{TableData, Value};

#[derive(Debug)]
enum TableAction {
    Fill(TableData),
    Remove,
}

#[derive(Debug)]
struct PendingTable {
    anchor: Anchor,
    kind: DirectiveKind,
    action: TableAction,
}

/// Populates or removes the table a `resolveTable` comment points at.
#[derive(Debug, Default)]
pub struct TableResolverProcessor {
    pending: Vec<PendingTable>,
}

impl TableResolverProcessor {
    /// Create a processor with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }
}

/// The table covered by the comment, or the one around its paragraph.
fn target_table(document: &Document, anchor: &Anchor) -> Option<NodeId> {
    anchor
        .comment
        .blocks
        .iter()
        .copied()
        .find(|id| document.table(*id).is_some())
        .or_else(|| anchor.cell.map(|cell| cell.table))
}

/// Replace a cell's content with `text`, keeping the formatting of its
/// first paragraph and first run.
fn fill_cell(cell: &mut TableCell, text: &str) {
    let mut para = cell
        .content
        .iter()
        .find_map(Block::as_paragraph)
        .cloned()
        .unwrap_or_default();
    let style = para.runs().next().map(|run| run.style.clone()).unwrap_or_default();
    para.content.clear();
    para.add_run(Run::styled(text, style));
    cell.content = vec![Block::Paragraph(para)];
}

fn fill_row(template: &TableRow, record: &[String], columns: usize) -> TableRow {
    let mut row = template.clone();
    for (i, cell) in row.cells.iter_mut().enumerate() {
        let text = record.get(i).filter(|_| i < columns).map_or("", String::as_str);
        fill_cell(cell, text);
    }
    row
}

impl DirectiveProcessor for TableResolverProcessor {
    fn signatures(&self) -> Vec<DirectiveSignature> {
        vec![DirectiveSignature::unary(DirectiveKind::ResolveTable)]
    }

    fn apply(&mut self, directive: Directive, config: &StampConfig) -> Result<()> {
        let action = match directive.arg() {
            Value::Table(data) => {
                if config.table_fill_policy == TableFillPolicy::Strict {
                    let expected = data.column_count();
                    if let Some(record) = data.records.iter().find(|r| r.len() != expected) {
                        return Err(Error::TableShape {
                            expected,
                            actual: record.len(),
                        });
                    }
                }
                TableAction::Fill(data.clone())
            }
            Value::Null => TableAction::Remove,
            other => return Err(directive.anchor.bad_argument(&directive.kind, "table", other)),
        };
        self.pending.push(PendingTable {
            anchor: directive.anchor,
            kind: directive.kind,
            action,
        });
        Ok(())
    }

    fn commit_changes(&mut self, document: &mut Document, context: &mut CommitContext<'_>) -> Result<()> {
        for pending in self.pending.drain(..) {
            let Some(table_id) = target_table(document, &pending.anchor) else {
                if pending.anchor.cell.is_none() && document.locate(pending.anchor.paragraph).is_none() {
                    log::debug!("comment {} anchor already detached", pending.anchor.comment.id);
                    continue;
                }
                return Err(pending
                    .anchor
                    .precondition(&pending.kind, "comment does not cover or sit inside a table"));
            };

            let data = match pending.action {
                TableAction::Remove => {
                    if document.remove_block(table_id).is_some() {
                        context.report.tables_removed += 1;
                    }
                    continue;
                }
                TableAction::Fill(data) => data,
            };

            let Some(table) = document.table(table_id) else {
                log::debug!("table {} already detached", table_id);
                continue;
            };
            if table.rows.is_empty() {
                log::warn!("table {} has no template row", table_id);
                continue;
            }
            let template_index = usize::from(table.rows.len() > 1);
            let template = table.rows[template_index].clone();

            let columns = data.column_count();
            if context.config.table_fill_policy == TableFillPolicy::Strict && template.cells.len() < columns {
                return Err(Error::TableShape {
                    expected: columns,
                    actual: template.cells.len(),
                });
            }
            let mut rows: Vec<TableRow> = data
                .records
                .iter()
                .map(|record| fill_row(&template, record, columns))
                .collect();
            for row in &mut rows {
                document.renumber_row(row);
            }

            let Some(table) = document.table_mut(table_id) else {
                continue;
            };
            if template_index == 1 {
                for (cell, header) in table.rows[0].cells.iter_mut().zip(&data.headers) {
                    fill_cell(cell, header);
                }
            }
            table.rows.splice(template_index..=template_index, rows);
            context.report.tables_filled += 1;
            log::debug!("filled table {} with {} rows", table_id, data.records.len());
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}
