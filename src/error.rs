//! Error types for docstamp library.

use thiserror::Error;

/// Result type alias for docstamp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while stamping a document.
#[derive(Error, Debug)]
pub enum Error {
    /// The expression engine rejected an expression at evaluation time.
    #[error("Failed to evaluate '{expression}': {message}")]
    Evaluation {
        /// Expression text (delimiters stripped)
        expression: String,
        /// Engine diagnostic
        message: String,
    },

    /// The expression text could not be parsed.
    #[error("Syntax error in '{expression}': {message}")]
    ExpressionSyntax {
        /// Expression text
        expression: String,
        /// Parser diagnostic
        message: String,
    },

    /// An expression failed and the configuration does not allow recovery.
    #[error("Expression {placeholder} could not be resolved in paragraph '{paragraph}': {source}")]
    UnresolvedExpression {
        /// The literal placeholder as written in the document
        placeholder: String,
        /// Text of the enclosing paragraph
        paragraph: String,
        /// Underlying evaluation failure
        #[source]
        source: Box<Error>,
    },

    /// No registered resolver accepted the evaluated value.
    #[error("No resolver found for {placeholder} (value of kind {kind})")]
    NoResolverFound {
        /// The literal placeholder
        placeholder: String,
        /// Kind of the value that could not be resolved
        kind: String,
    },

    /// A directive was anchored somewhere its structure rules forbid.
    #[error("Directive '{directive}' cannot be applied to paragraph '{paragraph}': {reason}")]
    StructuralPrecondition {
        /// Directive name
        directive: String,
        /// Text of the offending paragraph
        paragraph: String,
        /// What was expected
        reason: String,
    },

    /// A comment body is not a valid directive sequence.
    #[error("Malformed directive in comment '{comment}': {message}")]
    MalformedDirective {
        /// Comment body text
        comment: String,
        /// Parser or binding diagnostic
        message: String,
    },

    /// A comment invokes a directive nobody registered.
    #[error("Unknown directive '{name}' in comment '{comment}'")]
    UnknownDirective {
        /// Directive name
        name: String,
        /// Comment body text
        comment: String,
    },

    /// A directive argument evaluated to an unsupported kind of value.
    #[error("Directive '{directive}' expects {expected}, got {actual}")]
    DirectiveArgument {
        /// Directive name
        directive: String,
        /// Expected value kind
        expected: String,
        /// Actual value kind
        actual: String,
    },

    /// A custom function was called with the wrong number or kind of arguments.
    #[error("Function '{function}' expects ({expected}), got ({actual})")]
    FunctionMismatch {
        /// Function name
        function: String,
        /// Declared parameter kinds
        expected: String,
        /// Runtime argument kinds
        actual: String,
    },

    /// A data row does not match the template table (strict fill policy).
    #[error("Table row has {actual} cells but the table declares {expected} columns")]
    TableShape {
        /// Column count from the headers
        expected: usize,
        /// Cells in the offending row
        actual: usize,
    },

    /// Two processors claimed the same directive name.
    #[error("Directive '{0}' is already registered")]
    DuplicateDirective(String),

    /// The configured expression delimiters do not form a valid pattern.
    #[error("Invalid expression delimiters: {0}")]
    InvalidDelimiter(String),

    /// JSON snapshot (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an evaluation error.
    pub fn evaluation(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Evaluation {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Whether per-expression policies (leave empty, default text, keep
    /// placeholder) may absorb this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Evaluation { .. } | Error::ExpressionSyntax { .. }
        )
    }
}
