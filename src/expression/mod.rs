//! Inline expressions.
//!
//! [`ExpressionScanner`] finds delimiter-bounded placeholders in flattened
//! paragraph text. The remaining submodules form the small expression
//! engine that evaluates them: a nom parser producing an [`Expr`] tree, an
//! [`Evaluator`] with pluggable property accessors, and a
//! [`FunctionRegistry`] of typed custom functions.

mod ast;
mod evaluator;
mod function;
mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use evaluator::{Evaluator, PropertyAccessor};
pub use function::{CustomFunction, FunctionRegistry};
pub use parser::{parse_expression, parse_sequence};

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Delimiter pair that bounds an inline expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    prefix: String,
    suffix: String,
}

impl Matcher {
    /// Create a matcher for a custom delimiter pair.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let suffix = suffix.into();
        if prefix.is_empty() || suffix.is_empty() {
            return Err(Error::InvalidDelimiter(format!(
                "prefix '{}' and suffix '{}' must both be non-empty",
                prefix, suffix
            )));
        }
        Ok(Self { prefix, suffix })
    }

    /// Opening delimiter.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Closing delimiter.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Strip the delimiters from a raw placeholder.
    pub fn strip<'a>(&self, raw: &'a str) -> &'a str {
        let inner = raw.strip_prefix(self.prefix.as_str()).unwrap_or(raw);
        inner.strip_suffix(self.suffix.as_str()).unwrap_or(inner)
    }

    fn pattern(&self) -> String {
        format!(
            "(?s){}(.+?){}",
            regex::escape(&self.prefix),
            regex::escape(&self.suffix)
        )
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            prefix: "${".to_string(),
            suffix: "}".to_string(),
        }
    }
}

/// The literal delimited text as it appeared in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder(pub String);

impl Placeholder {
    /// The placeholder text, delimiters included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One placeholder occurrence found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    placeholder: Placeholder,
    matcher: Matcher,
    span: Range<usize>,
}

impl Expression {
    /// Build an expression from raw placeholder text.
    pub fn new(raw: impl Into<String>, matcher: Matcher, span: Range<usize>) -> Self {
        Self {
            placeholder: Placeholder(raw.into()),
            matcher,
            span,
        }
    }

    /// The placeholder as written.
    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    /// The raw text, delimiters included.
    pub fn raw(&self) -> &str {
        self.placeholder.as_str()
    }

    /// The expression text with delimiters stripped.
    pub fn inner(&self) -> &str {
        self.matcher.strip(self.placeholder.as_str())
    }

    /// Byte range in the scanned text.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// Finds placeholders in text.
#[derive(Debug, Clone)]
pub struct ExpressionScanner {
    matcher: Matcher,
    regex: Regex,
}

impl ExpressionScanner {
    /// Create a scanner for the given delimiters.
    pub fn new(matcher: Matcher) -> Result<Self> {
        let regex = Regex::new(&matcher.pattern())
            .map_err(|e| Error::InvalidDelimiter(e.to_string()))?;
        Ok(Self { matcher, regex })
    }

    /// Delimiters this scanner looks for.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Find every placeholder, left to right, without overlaps.
    pub fn find(&self, text: &str) -> Vec<Expression> {
        self.regex
            .find_iter(text)
            .map(|m| Expression::new(m.as_str(), self.matcher.clone(), m.range()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> ExpressionScanner {
        ExpressionScanner::new(Matcher::default()).unwrap()
    }

    #[test]
    fn test_find_adjacent_placeholders() {
        let scanner = scanner();
        let found = scanner.find("Dear ${first}${last}, total ${a + b}.");
        let raws: Vec<&str> = found.iter().map(Expression::raw).collect();
        assert_eq!(raws, vec!["${first}", "${last}", "${a + b}"]);
        assert_eq!(found[1].inner(), "last");
        assert_eq!(found[0].span(), 5..13);
    }

    #[test]
    fn test_find_nothing() {
        let scanner = scanner();
        assert!(scanner.find("").is_empty());
        assert!(scanner.find("no placeholders, not even ${}").is_empty());
    }

    #[test]
    fn test_custom_delimiters() {
        let scanner = ExpressionScanner::new(Matcher::new("#{", "}").unwrap()).unwrap();
        let found = scanner.find("a #{x} b ${y}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner(), "x");

        let scanner = ExpressionScanner::new(Matcher::new("[[", "]]").unwrap()).unwrap();
        let found = scanner.find("[[items[0]]] and [[b]]");
        assert_eq!(found[0].inner(), "items[0");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_empty_delimiters_rejected() {
        assert!(matches!(Matcher::new("", "}"), Err(Error::InvalidDelimiter(_))));
    }
}
