//! # docstamp
//!
//! Expression-driven template stamping for structured word-processing
//! documents.
//!
//! A template is an ordinary document tree (paragraphs, runs, tables,
//! comments). Inline placeholders such as `${customer.name}` are replaced
//! with values computed from a data context, and reviewer comments carry
//! directives that rewrite the structure around them: conditional removal
//! of paragraphs, rows and tables, paragraph repetition, word replacement
//! and table filling.
//!
//! ## Quick Start
//!
//! ```
//! use docstamp::model::{Block, Comment, CommentId, Document, InlineContent, Paragraph};
//! use docstamp::{stamp, Value};
//!
//! fn main() -> docstamp::Result<()> {
//!     let mut note = Paragraph::new();
//!     note.push(InlineContent::CommentRangeStart(CommentId(1)));
//!     note.add_text("Payment overdue");
//!     note.push(InlineContent::CommentRangeEnd(CommentId(1)));
//!
//!     let mut doc = Document::with_body([
//!         Block::from(Paragraph::with_text("Invoice for ${customer}")),
//!         Block::from(note),
//!     ]);
//!     doc.add_comment(Comment::new(1, "displayParagraphIf(overdue)"));
//!
//!     let context = Value::map([("customer", Value::from("ACME")), ("overdue", Value::from(false))]);
//!     stamp(&mut doc, &context)?;
//!
//!     assert_eq!(doc.plain_text(), "Invoice for ACME");
//!     assert!(doc.comments.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Run-aware replacement**: placeholders may span runs; formatting of the
//!   surrounding text is kept
//! - **Resolver chain**: pluggable conversion of values into document content
//! - **Comment directives**: `displayParagraphIf`, `displayParagraphIfPresent`,
//!   `displayTableRowIf`, `displayTableIf`, `repeatParagraph`,
//!   `replaceWordWith`, `resolveTable`, plus custom processors
//! - **Atomic**: a failed stamp leaves the document untouched
//! - **Parallel batches**: independent documents are stamped with Rayon

pub mod config;
pub mod directive;
pub mod error;
pub mod expression;
pub mod model;
pub mod resolver;
pub mod stamp;
pub mod value;

// Re-export commonly used types
pub use config::{NullPolicy, ReplaceWordNullPolicy, StampConfig, TableFillPolicy};
pub use directive::{DirectiveProcessor, DirectiveRegistry, DirectiveSignature};
pub use error::{Error, Result};
pub use model::{Block, Comment, CommentId, Document, InlineContent, Paragraph, Run, RunStyle, Table};
pub use resolver::{ObjectResolver, Resolution, ResolverChain};
pub use stamp::{CleanupOptions, DocStamper, StampReport};
pub use value::{TableData, Value, ValueKind};

/// Stamp a document with the default configuration.
///
/// # Arguments
///
/// * `document` - Template to fill in place
/// * `context` - Root object expressions are evaluated against
///
/// # Example
///
/// ```
/// use docstamp::model::{Block, Document, Paragraph};
/// use docstamp::Value;
///
/// let mut doc = Document::with_body([Block::from(Paragraph::with_text("${a + b}"))]);
/// docstamp::stamp(&mut doc, &Value::map([("a", 1), ("b", 2)])).unwrap();
/// assert_eq!(doc.plain_text(), "3");
/// ```
pub fn stamp(document: &mut Document, context: &Value) -> Result<StampReport> {
    DocStamper::new().stamp(document, context)
}

/// Stamp a document with custom options.
pub fn stamp_with_config(document: &mut Document, context: &Value, config: StampConfig) -> Result<StampReport> {
    DocStamper::new().with_config(config).stamp(document, context)
}

/// Stamp a document given as a JSON snapshot, with the context as JSON.
///
/// # Example
///
/// ```
/// use docstamp::model::{to_json, Block, Document, JsonFormat, Paragraph};
///
/// let doc = Document::with_body([Block::from(Paragraph::with_text("Hi ${name}"))]);
/// let json = to_json(&doc, JsonFormat::Compact).unwrap();
///
/// let stamped = docstamp::stamp_json(&json, &serde_json::json!({"name": "Ada"})).unwrap();
/// assert_eq!(stamped.plain_text(), "Hi Ada");
/// ```
pub fn stamp_json(document: &str, context: &serde_json::Value) -> Result<Document> {
    let mut doc = model::from_json(document)?;
    stamp(&mut doc, &Value::from(context.clone()))?;
    Ok(doc)
}
