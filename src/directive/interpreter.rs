//! Comment body parsing and directive dispatch.

use super::{Anchor, Directive, DirectiveKind, ProcessorSet};
use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::expression::{parse_sequence, Evaluator, Expr};
use crate::stamp::CommentRange;
use crate::value::Value;

/// One directive call as written in a comment, arguments unevaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDirective {
    /// Which directive
    pub kind: DirectiveKind,

    /// Argument expressions
    pub args: Vec<Expr>,

    /// The call as text, for diagnostics
    pub text: String,
}

/// Parse a comment body into directive calls.
///
/// A blank body holds no directives. Anything that is not a sequence of
/// `name(args...)` calls separated by `;` or whitespace is malformed.
pub fn parse_directives(comment: &str) -> Result<Vec<ParsedDirective>> {
    if comment.trim().is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |message: String| Error::MalformedDirective {
        comment: comment.trim().to_string(),
        message,
    };

    let calls = parse_sequence(comment).map_err(|err| match err {
        Error::ExpressionSyntax { message, .. } => malformed(message),
        other => other,
    })?;

    calls
        .into_iter()
        .map(|call| {
            let text = call.to_string();
            match call {
                Expr::Call { name, args } => Ok(ParsedDirective {
                    kind: DirectiveKind::from_name(&name),
                    args,
                    text,
                }),
                _ => Err(malformed(format!("'{}' is not a directive call", text))),
            }
        })
        .collect()
}

/// Turns comment bodies into directive invocations.
#[derive(Debug, Clone, Copy)]
pub struct CommentDirectiveInterpreter<'a> {
    evaluator: &'a Evaluator,
    config: &'a StampConfig,
}

impl<'a> CommentDirectiveInterpreter<'a> {
    /// Create an interpreter.
    pub fn new(evaluator: &'a Evaluator, config: &'a StampConfig) -> Self {
        Self { evaluator, config }
    }

    /// Parse a comment and check every call against the registered
    /// signatures.
    ///
    /// Returns `None` when the comment is malformed and lenient mode is on;
    /// such comments are left in the document untouched.
    pub fn prepare(&self, comment: &CommentRange, processors: &ProcessorSet) -> Result<Option<Vec<ParsedDirective>>> {
        match self.check(comment, processors) {
            Ok(directives) => Ok(Some(directives)),
            Err(err) if self.config.lenient_directives && is_directive_error(&err) => {
                log::warn!("Skipping comment {}: {}", comment.id, err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn check(&self, comment: &CommentRange, processors: &ProcessorSet) -> Result<Vec<ParsedDirective>> {
        let directives = parse_directives(&comment.text)?;
        for directive in &directives {
            let name = directive.kind.name();
            let Some(signature) = processors.signature(name) else {
                return Err(Error::UnknownDirective {
                    name: name.to_string(),
                    comment: comment.text.trim().to_string(),
                });
            };
            if signature.arity != directive.args.len() {
                return Err(Error::MalformedDirective {
                    comment: comment.text.trim().to_string(),
                    message: format!(
                        "{} takes {} argument(s), {} given",
                        name,
                        signature.arity,
                        directive.args.len()
                    ),
                });
            }
        }
        Ok(directives)
    }

    /// Evaluate the arguments of every directive in `scope` and hand the
    /// invocations to their processors.
    ///
    /// All arguments are evaluated before anything is applied, so a comment
    /// is either dispatched whole or not at all. Returns the number of
    /// directives applied, or `None` when evaluation failed and either
    /// lenient mode or an expression recovery policy absorbs the failure.
    pub fn dispatch(
        &self,
        directives: &[ParsedDirective],
        anchor: &Anchor,
        scope: &Value,
        processors: &mut ProcessorSet,
    ) -> Result<Option<usize>> {
        let absorbs = self.config.lenient_directives || self.config.recovers_unresolved();
        let mut evaluated = Vec::with_capacity(directives.len());
        for directive in directives {
            match self.evaluate_args(directive, scope) {
                Ok(args) => evaluated.push((directive.kind.clone(), args)),
                Err(err) if err.is_recoverable() && absorbs => {
                    log::warn!("Skipping '{}': {}", directive.text, err);
                    return Ok(None);
                }
                Err(err) => {
                    return Err(Error::UnresolvedExpression {
                        placeholder: directive.text.clone(),
                        paragraph: anchor.paragraph_text.clone(),
                        source: Box::new(err),
                    });
                }
            }
        }

        let count = evaluated.len();
        for (kind, args) in evaluated {
            log::trace!("Applying {} at paragraph {}", kind, anchor.paragraph);
            processors.apply(
                Directive {
                    kind,
                    args,
                    anchor: anchor.clone(),
                },
                self.config,
            )?;
        }
        Ok(Some(count))
    }

    fn evaluate_args(&self, directive: &ParsedDirective, scope: &Value) -> Result<Vec<Value>> {
        directive
            .args
            .iter()
            .map(|arg| self.evaluator.eval(arg, scope))
            .collect()
    }
}

fn is_directive_error(err: &Error) -> bool {
    matches!(err, Error::MalformedDirective { .. } | Error::UnknownDirective { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::DirectiveRegistry;
    use crate::model::{CommentId, NodeId};

    fn range(text: &str) -> CommentRange {
        CommentRange {
            id: CommentId(1),
            text: text.to_string(),
            parent: None,
            start: NodeId::UNASSIGNED,
            end: NodeId::UNASSIGNED,
            blocks: Vec::new(),
            preceding_section_break: None,
            section_break_count: 0,
            run_anchored: false,
        }
    }

    fn anchor(text: &str) -> Anchor {
        Anchor {
            comment: range(text),
            paragraph: NodeId::UNASSIGNED,
            paragraph_text: "Total".to_string(),
            cell: None,
        }
    }

    #[test]
    fn test_parse_sequence_of_calls() {
        let parsed = parse_directives("repeatParagraph(items); displayParagraphIf(items.size > 0)").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].kind, DirectiveKind::RepeatParagraph);
        assert_eq!(parsed[1].kind, DirectiveKind::DisplayParagraphIf);
        assert_eq!(parsed[1].args.len(), 1);
    }

    #[test]
    fn test_parse_blank_comment() {
        assert!(parse_directives("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_calls() {
        assert!(matches!(
            parse_directives("just a reviewer note"),
            Err(Error::MalformedDirective { .. })
        ));
        assert!(matches!(
            parse_directives("displayParagraphIf(true"),
            Err(Error::MalformedDirective { .. })
        ));
    }

    #[test]
    fn test_prepare_checks_names_and_arity() {
        let evaluator = Evaluator::new();
        let config = StampConfig::default();
        let interpreter = CommentDirectiveInterpreter::new(&evaluator, &config);
        let set = DirectiveRegistry::with_defaults().instantiate();

        assert!(matches!(
            interpreter.prepare(&range("stampLogo(x)"), &set),
            Err(Error::UnknownDirective { name, .. }) if name == "stampLogo"
        ));
        assert!(matches!(
            interpreter.prepare(&range("displayParagraphIf(a, b)"), &set),
            Err(Error::MalformedDirective { .. })
        ));
        assert_eq!(
            interpreter
                .prepare(&range("displayParagraphIf(true)"), &set)
                .unwrap()
                .map(|d| d.len()),
            Some(1)
        );
    }

    #[test]
    fn test_lenient_prepare_skips() {
        let evaluator = Evaluator::new();
        let config = StampConfig::default().lenient();
        let interpreter = CommentDirectiveInterpreter::new(&evaluator, &config);
        let set = DirectiveRegistry::with_defaults().instantiate();

        assert_eq!(interpreter.prepare(&range("stampLogo(x)"), &set).unwrap(), None);
    }

    #[test]
    fn test_dispatch_evaluation_failure() {
        let evaluator = Evaluator::new();
        let strict = StampConfig::default();
        let mut set = DirectiveRegistry::with_defaults().instantiate();
        let directives = parse_directives("displayParagraphIf(missing.flag)").unwrap();
        let anchor = anchor("displayParagraphIf(missing.flag)");
        let scope = Value::map([("other", 1)]);

        let err = CommentDirectiveInterpreter::new(&evaluator, &strict)
            .dispatch(&directives, &anchor, &scope, &mut set)
            .unwrap_err();
        match err {
            Error::UnresolvedExpression { paragraph, .. } => assert_eq!(paragraph, "Total"),
            other => panic!("unexpected error: {other}"),
        }

        let lenient = StampConfig::default().lenient();
        let applied = CommentDirectiveInterpreter::new(&evaluator, &lenient)
            .dispatch(&directives, &anchor, &scope, &mut set)
            .unwrap();
        assert_eq!(applied, None);

        for config in [
            StampConfig::default().with_fail_on_unresolved(false),
            StampConfig::default().leave_empty_on_error(true),
        ] {
            let applied = CommentDirectiveInterpreter::new(&evaluator, &config)
                .dispatch(&directives, &anchor, &scope, &mut set)
                .unwrap();
            assert_eq!(applied, None);
        }
    }

    #[test]
    fn test_dispatch_applies() {
        let evaluator = Evaluator::new();
        let config = StampConfig::default();
        let mut set = DirectiveRegistry::with_defaults().instantiate();
        let directives = parse_directives("displayParagraphIf(flag)").unwrap();

        let applied = CommentDirectiveInterpreter::new(&evaluator, &config)
            .dispatch(
                &directives,
                &anchor("displayParagraphIf(flag)"),
                &Value::map([("flag", false)]),
                &mut set,
            )
            .unwrap();
        assert_eq!(applied, Some(1));
    }
}
