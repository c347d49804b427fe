//! `replaceWordWith`: overwrite the commented run.

use super::{CommitContext, Directive, DirectiveKind, DirectiveProcessor, DirectiveSignature};
use crate::config::{ReplaceWordNullPolicy, StampConfig};
use crate::error::Result;
use crate::model::{CommentId, Document, InlineContent, NodeId};
use crate::resolver::text_content;
use crate::value::Value;

#[derive(Debug)]
struct PendingWord {
    paragraph: NodeId,
    comment: CommentId,
    text: String,
}

/// Replaces the text of the run a comment is anchored to, keeping its
/// formatting.
#[derive(Debug, Default)]
pub struct ReplaceWordProcessor {
    pending: Vec<PendingWord>,
}

impl ReplaceWordProcessor {
    /// Create a processor with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectiveProcessor for ReplaceWordProcessor {
    fn signatures(&self) -> Vec<DirectiveSignature> {
        vec![DirectiveSignature::unary(DirectiveKind::ReplaceWordWith)]
    }

    fn apply(&mut self, directive: Directive, config: &StampConfig) -> Result<()> {
        let anchor = &directive.anchor;
        if !anchor.comment.run_anchored {
            if config.lenient_directives {
                log::warn!("comment {} is not anchored to a run, skipping", anchor.comment.id);
                return Ok(());
            }
            return Err(anchor.precondition(&directive.kind, "comment is not anchored to a run"));
        }

        let text = match directive.arg() {
            Value::String(s) => s.clone(),
            Value::Null => match &config.replace_word_null_policy {
                ReplaceWordNullPolicy::KeepOriginal => return Ok(()),
                ReplaceWordNullPolicy::Empty => String::new(),
                ReplaceWordNullPolicy::Text(text) => text.clone(),
            },
            value @ (Value::List(_) | Value::Map(_) | Value::Table(_)) => {
                return Err(anchor.bad_argument(&directive.kind, "text", value));
            }
            scalar => scalar.to_string(),
        };

        self.pending.push(PendingWord {
            paragraph: anchor.paragraph,
            comment: anchor.comment.id,
            text,
        });
        Ok(())
    }

    fn commit_changes(&mut self, document: &mut Document, context: &mut CommitContext<'_>) -> Result<()> {
        let line_break = context.config.line_break_placeholder.as_deref();
        for word in self.pending.drain(..) {
            let Some(para) = document.paragraph_mut(word.paragraph) else {
                log::debug!("paragraph {} already detached", word.paragraph);
                continue;
            };
            let start = para
                .content
                .iter()
                .position(|c| *c == InlineContent::CommentRangeStart(word.comment));
            let end = para
                .content
                .iter()
                .position(|c| *c == InlineContent::CommentRangeEnd(word.comment));
            let (Some(start), Some(end)) = (start, end) else {
                log::debug!("comment {} anchors are gone", word.comment);
                continue;
            };

            let mut first_run = true;
            let mut index = start + 1;
            let mut end = end;
            while index < end {
                let InlineContent::Run(run) = &mut para.content[index] else {
                    index += 1;
                    continue;
                };
                if first_run {
                    run.content = text_content(&word.text, line_break);
                    first_run = false;
                    index += 1;
                } else {
                    para.content.remove(index);
                    end -= 1;
                }
            }
            if !first_run {
                context.report.words_replaced += 1;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Anchor;
    use crate::expression::{Evaluator, ExpressionScanner, Matcher};
    use crate::model::{Block, Comment, Paragraph, Run};
    use crate::resolver::ResolverChain;
    use crate::stamp::{collect_comment_ranges, PlaceholderReplacer, StampReport};

    fn doc() -> Document {
        let mut para = Paragraph::new();
        para.add_text("Dear ");
        para.push(InlineContent::CommentRangeStart(CommentId(1)));
        para.add_run(Run::bold("Sir"));
        para.add_run(Run::bold(" or Madam"));
        para.push(InlineContent::CommentRangeEnd(CommentId(1)));
        para.push(InlineContent::CommentReference(CommentId(1)));
        para.add_text(",");
        let mut doc = Document::with_body([Block::from(para)]);
        doc.add_comment(Comment::new(1, "replaceWordWith(name)"));
        doc
    }

    fn directive(doc: &Document, value: Value) -> Directive {
        let range = collect_comment_ranges(doc).remove(0);
        Directive {
            kind: DirectiveKind::ReplaceWordWith,
            args: vec![value],
            anchor: Anchor {
                paragraph: range.start,
                paragraph_text: String::new(),
                comment: range,
                cell: None,
            },
        }
    }

    fn run(config: &StampConfig, value: Value) -> (Document, Result<StampReport>) {
        let mut doc = doc();
        let mut processor = ReplaceWordProcessor::new();
        if let Err(err) = processor.apply(directive(&doc, value), config) {
            return (doc, Err(err));
        }

        let scanner = ExpressionScanner::new(Matcher::default()).unwrap();
        let evaluator = Evaluator::new();
        let resolvers = ResolverChain::with_defaults();
        let mut report = StampReport::new();
        let mut context = CommitContext {
            replacer: PlaceholderReplacer::new(&scanner, &evaluator, &resolvers, config),
            config,
            report: &mut report,
        };
        let result = processor.commit_changes(&mut doc, &mut context);
        (doc, result.map(|_| report))
    }

    #[test]
    fn test_replace_keeps_style() {
        let (doc, report) = run(&StampConfig::default(), Value::from("Ada"));
        assert_eq!(report.unwrap().words_replaced, 1);
        assert_eq!(doc.plain_text(), "Dear Ada,");
        let para = doc.body[0].as_paragraph().unwrap();
        let replaced = para.runs().find(|r| r.text() == "Ada").unwrap();
        assert!(replaced.style.bold);
    }

    #[test]
    fn test_scalar_is_stringified() {
        let (doc, _) = run(&StampConfig::default(), Value::Int(42));
        assert_eq!(doc.plain_text(), "Dear 42,");
    }

    #[test]
    fn test_null_policies() {
        let (doc, _) = run(&StampConfig::default(), Value::Null);
        assert_eq!(doc.plain_text(), "Dear Sir or Madam,");

        let config = StampConfig::default().with_replace_word_null_policy(ReplaceWordNullPolicy::Empty);
        let (doc, _) = run(&config, Value::Null);
        assert_eq!(doc.plain_text(), "Dear ,");

        let config =
            StampConfig::default().with_replace_word_null_policy(ReplaceWordNullPolicy::Text("friend".into()));
        let (doc, _) = run(&config, Value::Null);
        assert_eq!(doc.plain_text(), "Dear friend,");
    }

    #[test]
    fn test_collection_rejected() {
        let (_, result) = run(&StampConfig::default(), Value::list([1, 2]));
        assert!(matches!(result, Err(crate::Error::DirectiveArgument { .. })));
    }

    #[test]
    fn test_requires_run_anchor() {
        let doc = doc();
        let mut directive = directive(&doc, Value::from("x"));
        directive.anchor.comment.run_anchored = false;

        let mut processor = ReplaceWordProcessor::new();
        assert!(matches!(
            processor.apply(directive.clone(), &StampConfig::default()),
            Err(crate::Error::StructuralPrecondition { .. })
        ));
        assert!(processor.apply(directive, &StampConfig::default().lenient()).is_ok());
        assert!(processor.pending.is_empty());
    }
}
