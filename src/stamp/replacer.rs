//! Inline placeholder replacement.
//!
//! A paragraph's text is spread over runs, and a placeholder may start in
//! one run and end in another. The replacer scans the flattened paragraph
//! text, evaluates and resolves each placeholder, and splices the result
//! back into the run sequence:
//!
//! - inside a single run, the run is split into prefix, placeholder and
//!   suffix, all three keeping the original formatting;
//! - across runs, the covered runs collapse into one placeholder run styled
//!   like the run where the placeholder starts, and any comment anchors
//!   between them move after it.
//!
//! Placeholders are handled left to right, so each splice only shifts the
//! offsets of the ones still to come.

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::expression::{Evaluator, Expression, ExpressionScanner};
use crate::model::{Bias, Block, InlineContent, Paragraph, RunContent};
use crate::resolver::{text_content, Resolution, ResolveContext, ResolverChain};
use crate::value::Value;

/// Counts from one replacement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    /// Placeholders replaced with resolved content
    pub resolved: u32,
    /// Placeholders whose failure a policy absorbed
    pub recovered: u32,
}

impl ReplaceStats {
    fn add(&mut self, other: ReplaceStats) {
        self.resolved += other.resolved;
        self.recovered += other.recovered;
    }
}

/// Replaces inline placeholders in paragraphs.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderReplacer<'a> {
    scanner: &'a ExpressionScanner,
    evaluator: &'a Evaluator,
    resolvers: &'a ResolverChain,
    config: &'a StampConfig,
}

impl<'a> PlaceholderReplacer<'a> {
    /// Create a replacer over the given collaborators.
    pub fn new(
        scanner: &'a ExpressionScanner,
        evaluator: &'a Evaluator,
        resolvers: &'a ResolverChain,
        config: &'a StampConfig,
    ) -> Self {
        Self {
            scanner,
            evaluator,
            resolvers,
            config,
        }
    }

    /// Replace placeholders in every paragraph of `blocks`, tables included.
    pub fn resolve_blocks(&self, blocks: &mut [Block], scope: &Value) -> Result<ReplaceStats> {
        let mut stats = ReplaceStats::default();
        for block in blocks {
            match block {
                Block::Paragraph(para) => stats.add(self.resolve_paragraph(para, scope)?),
                Block::Table(table) => {
                    for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                        stats.add(self.resolve_blocks(&mut cell.content, scope)?);
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Replace the placeholders of one paragraph.
    pub fn resolve_paragraph(&self, para: &mut Paragraph, scope: &Value) -> Result<ReplaceStats> {
        let mut stats = ReplaceStats::default();
        let text = para.text();
        let expressions = self.scanner.find(&text);

        let mut delta: isize = 0;
        for expression in &expressions {
            let Some(resolution) = self.resolve_expression(expression, scope, &text, &mut stats)? else {
                continue;
            };
            let span = expression.span();
            let start = rebase(span.start, delta);
            let end = rebase(span.end, delta);
            let inserted = splice(para, start, end, resolution);
            delta += inserted as isize - (end - start) as isize;
        }

        if let Some(literal) = self.config.line_break_placeholder.as_deref() {
            replace_line_breaks(para, literal);
        }
        Ok(stats)
    }

    /// Evaluate and resolve one placeholder. `None` leaves it untouched.
    fn resolve_expression(
        &self,
        expression: &Expression,
        scope: &Value,
        paragraph: &str,
        stats: &mut ReplaceStats,
    ) -> Result<Option<Resolution>> {
        let context = ResolveContext::new(self.config);
        let result = self
            .evaluator
            .evaluate(scope, expression.inner())
            .and_then(|value| self.resolvers.resolve(&context, expression.placeholder(), &value));

        match result {
            Ok(resolution) => {
                stats.resolved += 1;
                Ok(Some(resolution))
            }
            Err(err) if err.is_recoverable() => {
                let recovered = self.recover(expression, paragraph, err)?;
                stats.recovered += 1;
                Ok(recovered)
            }
            Err(err) => Err(unresolved(expression, paragraph, err)),
        }
    }

    fn recover(&self, expression: &Expression, paragraph: &str, err: Error) -> Result<Option<Resolution>> {
        if self.config.leave_empty_on_expression_error {
            log::warn!("{} left empty: {}", expression.raw(), err);
            Ok(Some(Resolution::text("")))
        } else if self.config.replace_unresolved_expressions {
            log::warn!("{} replaced with default value: {}", expression.raw(), err);
            Ok(Some(Resolution::text(
                self.config.unresolved_expressions_default_value.clone(),
            )))
        } else if !self.config.fail_on_unresolved_expression {
            log::warn!("{} left unresolved: {}", expression.raw(), err);
            Ok(None)
        } else {
            Err(unresolved(expression, paragraph, err))
        }
    }
}

/// Terminal failure of `expression`, carrying the paragraph it sits in.
fn unresolved(expression: &Expression, paragraph: &str, err: Error) -> Error {
    Error::UnresolvedExpression {
        placeholder: expression.raw().to_string(),
        paragraph: paragraph.to_string(),
        source: Box::new(err),
    }
}

fn rebase(offset: usize, delta: isize) -> usize {
    (offset as isize + delta).max(0) as usize
}

/// Replace the text at `start..end` with `resolution`. Returns the length
/// of the inserted text.
fn splice(para: &mut Paragraph, start: usize, end: usize, resolution: Resolution) -> usize {
    let spans = para.run_spans();
    let first = spans.iter().find(|s| s.contains(start));
    let last = spans.iter().find(|s| s.contains(end.saturating_sub(1)));
    let (Some(first), Some(last)) = (first.copied(), last.copied()) else {
        return end - start;
    };
    let inserted = resolution.text_content().len();

    let mut replacement: Vec<InlineContent> = Vec::new();
    let (prefix, mut placeholder, suffix) = if first.index == last.index {
        let InlineContent::Run(run) = &para.content[first.index] else {
            return end - start;
        };
        let mut prefix = run.clone();
        let suffix = prefix.split_off(end - first.start, Bias::Right);
        let placeholder = prefix.split_off(start - first.start, Bias::Left);
        (prefix, placeholder, suffix)
    } else {
        let (InlineContent::Run(head), InlineContent::Run(tail)) =
            (&para.content[first.index], &para.content[last.index])
        else {
            return end - start;
        };
        let mut prefix = head.clone();
        let placeholder = prefix.split_off(start - first.start, Bias::Left);
        let mut covered_tail = tail.clone();
        let suffix = covered_tail.split_off(end - last.start, Bias::Right);

        // Anchors inside the placeholder survive after it
        for item in &para.content[first.index + 1..last.index] {
            if !matches!(item, InlineContent::Run(_)) {
                replacement.push(item.clone());
            }
        }
        (prefix, placeholder, suffix)
    };

    match resolution {
        Resolution::Content(items) => placeholder.content = items,
        Resolution::Run(run) => placeholder = run,
    }

    let mut spliced = Vec::with_capacity(replacement.len() + 3);
    if !prefix.is_empty() {
        spliced.push(InlineContent::Run(prefix));
    }
    spliced.push(InlineContent::Run(placeholder));
    spliced.append(&mut replacement);
    if !suffix.is_empty() {
        spliced.push(InlineContent::Run(suffix));
    }
    para.content.splice(first.index..=last.index, spliced);
    inserted
}

/// Turn every occurrence of the line-break literal inside run text into a
/// line break.
fn replace_line_breaks(para: &mut Paragraph, literal: &str) {
    if literal.is_empty() {
        return;
    }
    for run in para.runs_mut() {
        if !run.text().contains(literal) {
            continue;
        }
        let content = std::mem::take(&mut run.content);
        for item in content {
            match item {
                RunContent::Text(text) if text.contains(literal) => {
                    run.content.extend(text_content(&text, Some(literal)));
                }
                other => run.content.push(other),
            }
        }
    }
}
