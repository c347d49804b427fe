//! `repeatParagraph`: one copy of the commented blocks per list item.

use super::{Anchor, CommitContext, Directive, DirectiveKind, DirectiveProcessor, DirectiveSignature};
use crate::config::StampConfig;
use crate::error::Result;
use crate::model::{Block, Document, NodeId};
use crate::stamp::strip_comment_anchors;
use crate::value::Value;

#[derive(Debug)]
struct PendingRepeat {
    anchor: Anchor,
    items: Vec<Value>,
}

/// Replicates a comment's block range once per item, resolving the
/// placeholders of each copy against that item.
#[derive(Debug, Default)]
pub struct RepeatParagraphProcessor {
    pending: Vec<PendingRepeat>,
}

impl RepeatParagraphProcessor {
    /// Create a processor with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every copy of the template from the blocks of the range that
    /// are still attached. Returns the ids of those blocks and the copies.
    fn generate(
        document: &mut Document,
        pending: &PendingRepeat,
        context: &mut CommitContext<'_>,
    ) -> Result<(Vec<NodeId>, Vec<Block>)> {
        let range = &pending.anchor.comment;
        let mut attached = Vec::with_capacity(range.blocks.len());
        let mut template = Vec::with_capacity(range.blocks.len());
        for id in &range.blocks {
            if let Some(block) = document.locate(*id).and_then(|path| document.block(&path)) {
                attached.push(*id);
                template.push(block.clone());
            }
        }
        if attached.len() < range.blocks.len() {
            log::debug!(
                "comment {}: {} of {} template blocks already removed",
                range.id,
                range.blocks.len() - attached.len(),
                range.blocks.len()
            );
        }

        let restore_break = range
            .preceding_section_break
            .as_ref()
            .filter(|_| range.has_odd_section_breaks());

        let mut generated = Vec::with_capacity(template.len() * pending.items.len());
        for (index, item) in pending.items.iter().enumerate() {
            let mut copy = template.clone();
            strip_comment_anchors(&mut copy);
            document.renumber(&mut copy);

            let stats = context.replacer.resolve_blocks(&mut copy, item)?;
            context.report.add_expressions(stats.resolved, stats.recovered);

            let more_items = index + 1 < pending.items.len();
            if let (Some(section), true) = (restore_break, more_items) {
                match copy.last_mut().and_then(Block::as_paragraph_mut) {
                    Some(last) => last.style.section_break = Some(section.clone()),
                    None => log::debug!("comment {} range does not end with a paragraph", range.id),
                }
            }
            generated.extend(copy);
        }
        Ok((attached, generated))
    }
}

impl DirectiveProcessor for RepeatParagraphProcessor {
    fn signatures(&self) -> Vec<DirectiveSignature> {
        vec![DirectiveSignature::unary(DirectiveKind::RepeatParagraph)]
    }

    fn defers_placeholders(&self, name: &str) -> bool {
        name == DirectiveKind::RepeatParagraph.name()
    }

    fn apply(&mut self, directive: Directive, _config: &StampConfig) -> Result<()> {
        let items = match directive.arg() {
            Value::List(items) => items.clone(),
            Value::Null => Vec::new(),
            other => return Err(directive.anchor.bad_argument(&directive.kind, "list", other)),
        };
        self.pending.push(PendingRepeat {
            anchor: directive.anchor,
            items,
        });
        Ok(())
    }

    fn commit_changes(&mut self, document: &mut Document, context: &mut CommitContext<'_>) -> Result<()> {
        for pending in self.pending.drain(..) {
            let (attached, generated) = Self::generate(document, &pending, context)?;
            if attached.is_empty() {
                log::debug!("comment {} template is no longer in the document", pending.anchor.comment.id);
                continue;
            }
            let count = generated.len() as u32;
            if document.replace_blocks(&attached, generated).is_none() {
                return Err(pending
                    .anchor
                    .precondition(&DirectiveKind::RepeatParagraph, "repeated range is no longer contiguous"));
            }
            context.report.blocks_repeated += count;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}
