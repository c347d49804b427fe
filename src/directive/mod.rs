//! Comment directives.
//!
//! A comment body such as `displayParagraphIf(order.paid)` or
//! `repeatParagraph(items); displayParagraphIf(items.size > 0)` is parsed as
//! a sequence of directive calls. Each call is routed by name to a
//! [`DirectiveProcessor`], which follows a two-phase protocol:
//!
//! 1. [`apply`](DirectiveProcessor::apply) is called during the document
//!    walk and only records the edit it wants, keyed by node id;
//! 2. [`commit_changes`](DirectiveProcessor::commit_changes) runs once the
//!    walk is over and performs every recorded edit;
//! 3. [`reset`](DirectiveProcessor::reset) clears the recorded state.
//!
//! Processors are created per stamping call from the factories held by a
//! [`DirectiveRegistry`], so no pending state is ever shared between calls.

mod display;
mod interpreter;
mod repeat;
mod replace;
mod table;

pub use display::DisplayIfProcessor;
pub use interpreter::{parse_directives, CommentDirectiveInterpreter, ParsedDirective};
pub use repeat::RepeatParagraphProcessor;
pub use replace::ReplaceWordProcessor;
pub use table::TableResolverProcessor;

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::model::{CellPosition, Document, NodeId};
use crate::stamp::{CommentRange, PlaceholderReplacer, StampReport};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The directives the crate knows, plus embedder-defined ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `displayParagraphIf(bool)`
    DisplayParagraphIf,
    /// `displayParagraphIfPresent(value)`
    DisplayParagraphIfPresent,
    /// `displayTableRowIf(bool)`
    DisplayTableRowIf,
    /// `displayTableIf(bool)`
    DisplayTableIf,
    /// `repeatParagraph(list)`
    RepeatParagraph,
    /// `replaceWordWith(text)`
    ReplaceWordWith,
    /// `resolveTable(table)`
    ResolveTable,
    /// A directive registered by the embedder
    Custom(String),
}

impl DirectiveKind {
    /// Map a directive name to its kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "displayParagraphIf" => DirectiveKind::DisplayParagraphIf,
            "displayParagraphIfPresent" => DirectiveKind::DisplayParagraphIfPresent,
            "displayTableRowIf" => DirectiveKind::DisplayTableRowIf,
            "displayTableIf" => DirectiveKind::DisplayTableIf,
            "repeatParagraph" => DirectiveKind::RepeatParagraph,
            "replaceWordWith" => DirectiveKind::ReplaceWordWith,
            "resolveTable" => DirectiveKind::ResolveTable,
            other => DirectiveKind::Custom(other.to_string()),
        }
    }

    /// Name as written in comments.
    pub fn name(&self) -> &str {
        match self {
            DirectiveKind::DisplayParagraphIf => "displayParagraphIf",
            DirectiveKind::DisplayParagraphIfPresent => "displayParagraphIfPresent",
            DirectiveKind::DisplayTableRowIf => "displayTableRowIf",
            DirectiveKind::DisplayTableIf => "displayTableIf",
            DirectiveKind::RepeatParagraph => "repeatParagraph",
            DirectiveKind::ReplaceWordWith => "replaceWordWith",
            DirectiveKind::ResolveTable => "resolveTable",
            DirectiveKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A directive name with its number of positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSignature {
    /// Directive name
    pub name: String,
    /// Number of arguments
    pub arity: usize,
}

impl DirectiveSignature {
    /// Create a signature.
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    /// Signature of a single-argument directive.
    pub fn unary(kind: DirectiveKind) -> Self {
        Self::new(kind.name(), 1)
    }
}

/// Where a directive was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// The comment carrying the directive
    pub comment: CommentRange,

    /// Paragraph where the comment starts
    pub paragraph: NodeId,

    /// Text of that paragraph, for diagnostics
    pub paragraph_text: String,

    /// Innermost table cell around the paragraph
    pub cell: Option<CellPosition>,
}

impl Anchor {
    /// Structural precondition failure for this anchor.
    pub fn precondition(&self, directive: &DirectiveKind, reason: impl Into<String>) -> Error {
        Error::StructuralPrecondition {
            directive: directive.name().to_string(),
            paragraph: self.paragraph_text.clone(),
            reason: reason.into(),
        }
    }

    /// Argument kind failure for this anchor.
    pub fn bad_argument(&self, directive: &DirectiveKind, expected: &str, actual: &Value) -> Error {
        Error::DirectiveArgument {
            directive: directive.name().to_string(),
            expected: expected.to_string(),
            actual: actual.kind().to_string(),
        }
    }
}

/// One evaluated directive invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Which directive
    pub kind: DirectiveKind,

    /// Evaluated positional arguments
    pub args: Vec<Value>,

    /// Where it was found
    pub anchor: Anchor,
}

impl Directive {
    /// First argument, `null` if absent.
    pub fn arg(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.args.first().unwrap_or(&NULL)
    }
}

/// Everything a processor may use while committing.
pub struct CommitContext<'a> {
    /// Replaces placeholders in generated content
    pub replacer: PlaceholderReplacer<'a>,

    /// Active configuration
    pub config: &'a StampConfig,

    /// Statistics of the current stamping call
    pub report: &'a mut StampReport,
}

/// A handler for one or more directives.
pub trait DirectiveProcessor: Send {
    /// The directives this processor handles.
    fn signatures(&self) -> Vec<DirectiveSignature>;

    /// Whether paragraphs covered by `name` keep their placeholders for the
    /// processor to resolve itself.
    fn defers_placeholders(&self, _name: &str) -> bool {
        false
    }

    /// Record a directive. Must not touch the document.
    fn apply(&mut self, directive: Directive, config: &StampConfig) -> Result<()>;

    /// Perform every recorded edit.
    fn commit_changes(&mut self, document: &mut Document, context: &mut CommitContext<'_>) -> Result<()>;

    /// Drop recorded state.
    fn reset(&mut self);
}

type ProcessorFactory = Arc<dyn Fn() -> Box<dyn DirectiveProcessor> + Send + Sync>;

/// Factories for directive processors, keyed by the names they handle.
///
/// Processors commit in registration order.
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    factories: Vec<ProcessorFactory>,
    signatures: Vec<DirectiveSignature>,
}

impl DirectiveRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in processors: conditional display,
    /// paragraph repetition, word replacement and table filling.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(|| -> Box<dyn DirectiveProcessor> { Box::new(DisplayIfProcessor::new()) }));
        registry.insert(Arc::new(|| -> Box<dyn DirectiveProcessor> { Box::new(RepeatParagraphProcessor::new()) }));
        registry.insert(Arc::new(|| -> Box<dyn DirectiveProcessor> { Box::new(ReplaceWordProcessor::new()) }));
        registry.insert(Arc::new(|| -> Box<dyn DirectiveProcessor> { Box::new(TableResolverProcessor::new()) }));
        registry
    }

    /// Register a processor factory. Fails if any of its directive names is
    /// already taken.
    pub fn register<F>(&mut self, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn DirectiveProcessor> + Send + Sync + 'static,
    {
        let signatures = factory().signatures();
        for signature in &signatures {
            let taken = self.contains(&signature.name)
                || signatures.iter().filter(|s| s.name == signature.name).count() > 1;
            if taken {
                return Err(Error::DuplicateDirective(signature.name.clone()));
            }
        }
        self.insert(Arc::new(factory));
        Ok(())
    }

    fn insert(&mut self, factory: ProcessorFactory) {
        self.signatures.extend(factory().signatures());
        self.factories.push(factory);
    }

    /// Check if a directive name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.signatures.iter().any(|s| s.name == name)
    }

    /// Registered directive names.
    pub fn names(&self) -> Vec<&str> {
        self.signatures.iter().map(|s| s.name.as_str()).collect()
    }

    /// Create a fresh set of processors.
    pub fn instantiate(&self) -> ProcessorSet {
        let processors: Vec<Box<dyn DirectiveProcessor>> = self.factories.iter().map(|f| f()).collect();
        let mut routes = HashMap::new();
        for (index, processor) in processors.iter().enumerate() {
            for signature in processor.signatures() {
                routes.insert(signature.name.clone(), (index, signature));
            }
        }
        ProcessorSet { processors, routes }
    }
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveRegistry")
            .field("directives", &self.names())
            .finish()
    }
}

/// Processors owned by one stamping call.
pub struct ProcessorSet {
    processors: Vec<Box<dyn DirectiveProcessor>>,
    routes: HashMap<String, (usize, DirectiveSignature)>,
}

impl ProcessorSet {
    /// Signature registered for `name`.
    pub fn signature(&self, name: &str) -> Option<&DirectiveSignature> {
        self.routes.get(name).map(|(_, signature)| signature)
    }

    /// Whether the processor for `name` resolves placeholders itself.
    pub fn defers_placeholders(&self, name: &str) -> bool {
        self.routes
            .get(name)
            .is_some_and(|(index, _)| self.processors[*index].defers_placeholders(name))
    }

    /// Route a directive to its processor.
    pub fn apply(&mut self, directive: Directive, config: &StampConfig) -> Result<()> {
        let Some((index, _)) = self.routes.get(directive.kind.name()) else {
            return Err(Error::UnknownDirective {
                name: directive.kind.name().to_string(),
                comment: directive.anchor.comment.text.clone(),
            });
        };
        self.processors[*index].apply(directive, config)
    }

    /// Commit every processor, in registration order.
    pub fn commit(&mut self, document: &mut Document, context: &mut CommitContext<'_>) -> Result<()> {
        for processor in &mut self.processors {
            processor.commit_changes(document, context)?;
        }
        Ok(())
    }

    /// Reset every processor.
    pub fn reset(&mut self) {
        for processor in &mut self.processors {
            processor.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(&'static str);

    impl DirectiveProcessor for Noop {
        fn signatures(&self) -> Vec<DirectiveSignature> {
            vec![DirectiveSignature::new(self.0, 2)]
        }

        fn apply(&mut self, _directive: Directive, _config: &StampConfig) -> Result<()> {
            Ok(())
        }

        fn commit_changes(&mut self, _document: &mut Document, _context: &mut CommitContext<'_>) -> Result<()> {
            Ok(())
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn test_kind_names_round_trip() {
        for name in [
            "displayParagraphIf",
            "displayParagraphIfPresent",
            "displayTableRowIf",
            "displayTableIf",
            "repeatParagraph",
            "replaceWordWith",
            "resolveTable",
        ] {
            let kind = DirectiveKind::from_name(name);
            assert!(!matches!(kind, DirectiveKind::Custom(_)));
            assert_eq!(kind.name(), name);
        }
        assert_eq!(
            DirectiveKind::from_name("stampLogo"),
            DirectiveKind::Custom("stampLogo".into())
        );
    }

    #[test]
    fn test_default_registry() {
        let registry = DirectiveRegistry::with_defaults();
        assert!(registry.contains("displayTableIf"));
        assert!(registry.contains("resolveTable"));

        let set = registry.instantiate();
        assert!(set.defers_placeholders("repeatParagraph"));
        assert!(!set.defers_placeholders("displayParagraphIf"));
        assert_eq!(set.signature("replaceWordWith").map(|s| s.arity), Some(1));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = DirectiveRegistry::with_defaults();
        assert!(registry.register(|| Box::new(Noop("stampLogo"))).is_ok());
        assert!(matches!(
            registry.register(|| Box::new(Noop("stampLogo"))),
            Err(Error::DuplicateDirective(name)) if name == "stampLogo"
        ));
        assert!(matches!(
            registry.register(|| Box::new(Noop("repeatParagraph"))),
            Err(Error::DuplicateDirective(_))
        ));
        assert_eq!(registry.instantiate().signature("stampLogo").map(|s| s.arity), Some(2));
    }
}
