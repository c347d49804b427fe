//! Document stamping.
//!
//! [`DocStamper`] drives one pass over a document:
//!
//! 1. cleanup passes that make placeholders contiguous (run merging,
//!    language stripping);
//! 2. comment discovery, parsing and validation of every directive;
//! 3. a single walk in reading order that replaces inline placeholders and
//!    hands each comment's directives to their processors;
//! 4. the commit phase, where processors perform the structural edits they
//!    recorded, followed by comment and orphan note removal.
//!
//! Stamping works on a copy of the document, so on error the caller's
//! document is left exactly as it was.

mod cleanup;
mod comments;
mod replacer;
mod report;

pub use cleanup::{merge_similar_runs, remove_orphan_notes, strip_language, CleanupOptions, CleanupPipeline};
pub use comments::{collect_comment_ranges, strip_comment_anchors, strip_comments, CommentRange};
pub use replacer::{PlaceholderReplacer, ReplaceStats};
pub use report::StampReport;

use crate::config::StampConfig;
use crate::directive::{
    Anchor, CommentDirectiveInterpreter, CommitContext, DirectiveProcessor, DirectiveRegistry, ParsedDirective,
    ProcessorSet,
};
use crate::error::Result;
use crate::expression::{Evaluator, ExpressionScanner, FunctionRegistry, Matcher, PropertyAccessor};
use crate::model::{walk_blocks_mut, BlockVisitor, CommentId, Document, NodeId, Paragraph, Position};
use crate::resolver::{ObjectResolver, ResolverChain};
use crate::value::{Value, ValueKind};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Fills documents from a data context.
///
/// # Example
///
/// ```
/// use docstamp::model::{Block, Document, Paragraph};
/// use docstamp::{DocStamper, Value};
///
/// let mut doc = Document::with_body([Block::from(Paragraph::with_text("Hello ${name}!"))]);
/// let context = Value::map([("name", "Ada")]);
///
/// let report = DocStamper::new().stamp(&mut doc, &context).unwrap();
/// assert_eq!(doc.plain_text(), "Hello Ada!");
/// assert_eq!(report.expressions_resolved, 1);
/// ```
#[derive(Debug, Clone)]
pub struct DocStamper {
    config: StampConfig,
    evaluator: Evaluator,
    resolvers: ResolverChain,
    directives: DirectiveRegistry,
}

impl Default for DocStamper {
    fn default() -> Self {
        Self::new()
    }
}

impl DocStamper {
    /// Create a stamper with the default configuration, the built-in
    /// resolvers and the built-in directives.
    pub fn new() -> Self {
        Self {
            config: StampConfig::default(),
            evaluator: Evaluator::new(),
            resolvers: ResolverChain::new(),
            directives: DirectiveRegistry::with_defaults(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: StampConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a resolver. Resolvers added here are tried in order, before the
    /// built-in ones.
    pub fn with_resolver(mut self, resolver: Arc<dyn ObjectResolver>) -> Self {
        self.resolvers.register(resolver);
        self
    }

    /// Add a function callable from expressions.
    pub fn with_function<F>(mut self, name: impl Into<String>, params: Vec<ValueKind>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let mut functions: FunctionRegistry = self.evaluator.functions().clone();
        functions.register(name, params, body);
        self.evaluator = self.evaluator.with_functions(functions);
        self
    }

    /// Add a property accessor, consulted before map lookup.
    pub fn with_accessor(mut self, accessor: Arc<dyn PropertyAccessor>) -> Self {
        self.evaluator = self.evaluator.with_accessor(accessor);
        self
    }

    /// Add a directive processor. Fails if one of its directive names is
    /// already registered.
    pub fn with_directive<F>(mut self, factory: F) -> Result<Self>
    where
        F: Fn() -> Box<dyn DirectiveProcessor> + Send + Sync + 'static,
    {
        self.directives.register(factory)?;
        Ok(self)
    }

    /// Get the configuration.
    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Get the directive registry.
    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    /// Resolvers in the order they are tried.
    fn resolver_chain(&self) -> ResolverChain {
        let mut chain = self.resolvers.clone();
        chain.register_defaults();
        chain
    }

    /// Stamp `document` in place with `context` as the root scope.
    ///
    /// On error the document is left unchanged.
    pub fn stamp(&self, document: &mut Document, context: &Value) -> Result<StampReport> {
        let mut doc = document.clone();
        let report = self.stamp_in_place(&mut doc, context)?;
        *document = doc;
        Ok(report)
    }

    /// Stamp independent documents in parallel.
    ///
    /// Every job gets its own processors; results come back in input order.
    pub fn stamp_batch(&self, jobs: Vec<(Document, Value)>) -> Vec<Result<(Document, StampReport)>> {
        jobs.into_par_iter()
            .map(|(mut document, context)| -> Result<(Document, StampReport)> {
                let report = self.stamp(&mut document, &context)?;
                Ok((document, report))
            })
            .collect()
    }

    fn stamp_in_place(&self, doc: &mut Document, context: &Value) -> Result<StampReport> {
        let config = &self.config;
        let scanner = ExpressionScanner::new(Matcher::new(
            config.expression_prefix.as_str(),
            config.expression_suffix.as_str(),
        )?)?;
        let resolvers = self.resolver_chain();
        let replacer = PlaceholderReplacer::new(&scanner, &self.evaluator, &resolvers, config);
        let interpreter = CommentDirectiveInterpreter::new(&self.evaluator, config);
        let cleanup = CleanupPipeline::new(CleanupOptions::from_config(config));

        let mut report = StampReport::new();
        let mut processors = self.directives.instantiate();

        doc.assign_ids();
        report.runs_merged = cleanup.prepare(doc) as u32;

        let plan = plan_comments(doc, &interpreter, &processors)?;
        report.directives_skipped = plan.skipped.len() as u32;
        let mut skipped = plan.skipped;

        {
            let mut visitor = StampVisitor {
                replacer,
                interpreter,
                scope: context,
                deferred: &plan.deferred,
                pending: plan.pending,
                processors: &mut processors,
                skipped: &mut skipped,
                report: &mut report,
            };
            walk_blocks_mut(&mut doc.body, &mut visitor)?;
        }

        let mut commit = CommitContext {
            replacer,
            config,
            report: &mut report,
        };
        processors.commit(doc, &mut commit)?;
        processors.reset();

        strip_comments(doc, &skipped);
        report.notes_removed = cleanup.finish(doc) as u32;

        log::debug!(
            "Stamped document: {} expressions resolved, {} directives applied, {} removals",
            report.expressions_resolved,
            report.directives_applied,
            report.removals()
        );
        Ok(report)
    }
}

/// Comments to dispatch, keyed by the paragraph where they start.
struct CommentPlan {
    pending: HashMap<NodeId, Vec<(CommentRange, Vec<ParsedDirective>)>>,
    deferred: HashSet<NodeId>,
    skipped: HashSet<CommentId>,
}

/// Parse and validate every comment before the walk.
///
/// Comments starting inside a range whose directive resolves placeholders
/// itself are not interpreted; the first such range in document order wins.
/// Replies are never interpreted.
fn plan_comments(
    doc: &Document,
    interpreter: &CommentDirectiveInterpreter<'_>,
    processors: &ProcessorSet,
) -> Result<CommentPlan> {
    let mut plan = CommentPlan {
        pending: HashMap::new(),
        deferred: HashSet::new(),
        skipped: HashSet::new(),
    };

    for range in collect_comment_ranges(doc) {
        if range.parent.is_some() {
            continue;
        }
        if plan.deferred.contains(&range.start) {
            log::debug!("comment {} is nested in a repeated range, not interpreted", range.id);
            continue;
        }
        let Some(directives) = interpreter.prepare(&range, processors)? else {
            plan.skipped.insert(range.id);
            continue;
        };
        if directives
            .iter()
            .any(|d| processors.defers_placeholders(d.kind.name()))
        {
            plan.deferred.extend(range.paragraph_ids(doc));
        }
        plan.pending.entry(range.start).or_default().push((range, directives));
    }
    Ok(plan)
}

struct StampVisitor<'a, 'b> {
    replacer: PlaceholderReplacer<'a>,
    interpreter: CommentDirectiveInterpreter<'a>,
    scope: &'b Value,
    deferred: &'b HashSet<NodeId>,
    pending: HashMap<NodeId, Vec<(CommentRange, Vec<ParsedDirective>)>>,
    processors: &'b mut ProcessorSet,
    skipped: &'b mut HashSet<CommentId>,
    report: &'b mut StampReport,
}

impl BlockVisitor for StampVisitor<'_, '_> {
    fn visit_paragraph(&mut self, para: &mut Paragraph, position: &Position) -> Result<()> {
        if !self.deferred.contains(&para.id) {
            let stats = self.replacer.resolve_paragraph(para, self.scope)?;
            self.report.add_expressions(stats.resolved, stats.recovered);
        }

        let Some(comments) = self.pending.remove(&para.id) else {
            return Ok(());
        };
        let paragraph_text = para.text();
        for (comment, directives) in comments {
            let anchor = Anchor {
                comment,
                paragraph: para.id,
                paragraph_text: paragraph_text.clone(),
                cell: position.cell().copied(),
            };
            match self
                .interpreter
                .dispatch(&directives, &anchor, self.scope, self.processors)?
            {
                Some(applied) => self.report.directives_applied += applied as u32,
                None => {
                    self.report.directives_skipped += 1;
                    self.skipped.insert(anchor.comment.id);
                }
            }
        }
        Ok(())
    }
}
