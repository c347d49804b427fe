//! Stamping options and configuration.

use serde::{Deserialize, Serialize};

/// Options controlling how a document is stamped.
///
/// The cleanup passes enabled by default (`merge_similar_runs` and
/// `strip_language`) run over every paragraph before placeholders are
/// found, so a paragraph without placeholders or directives can still come
/// out with fewer runs and no language tags. Its text and visible
/// formatting do not change. Use [`StampConfig::without_cleanup`] when such
/// paragraphs must be left exactly as they were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Abort the whole operation when an expression cannot be resolved
    pub fail_on_unresolved_expression: bool,

    /// Substitute `unresolved_expressions_default_value` for failed expressions
    pub replace_unresolved_expressions: bool,

    /// Text used when `replace_unresolved_expressions` is set
    pub unresolved_expressions_default_value: String,

    /// Replace failed expressions with nothing
    pub leave_empty_on_expression_error: bool,

    /// Opening delimiter of inline expressions
    pub expression_prefix: String,

    /// Closing delimiter of inline expressions
    pub expression_suffix: String,

    /// Literal turned into a line break wherever it appears
    pub line_break_placeholder: Option<String>,

    /// Log and skip malformed directives instead of failing
    pub lenient_directives: bool,

    /// How absent values render in inline expressions
    pub null_policy: NullPolicy,

    /// What `replaceWordWith(null)` does to the anchored run
    pub replace_word_null_policy: ReplaceWordNullPolicy,

    /// How table fill treats rows that do not match the header count
    pub table_fill_policy: TableFillPolicy,

    /// chrono format for date values
    pub date_format: String,

    /// chrono format for date-time values
    pub date_time_format: String,

    /// Merge neighbouring runs with identical formatting before stamping
    pub merge_similar_runs: bool,

    /// Drop language tags and proofing marks before stamping
    pub strip_language: bool,

    /// Delete footnotes and endnotes no longer referenced after stamping
    pub remove_orphan_notes: bool,
}

impl StampConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether unresolved expressions abort stamping.
    pub fn with_fail_on_unresolved(mut self, fail: bool) -> Self {
        self.fail_on_unresolved_expression = fail;
        self
    }

    /// Replace unresolved expressions with the given text.
    pub fn replace_unresolved_with(mut self, default_value: impl Into<String>) -> Self {
        self.replace_unresolved_expressions = true;
        self.unresolved_expressions_default_value = default_value.into();
        self
    }

    /// Replace failed expressions with empty content.
    pub fn leave_empty_on_error(mut self, leave_empty: bool) -> Self {
        self.leave_empty_on_expression_error = leave_empty;
        self
    }

    /// Use custom expression delimiters.
    pub fn with_delimiters(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.expression_prefix = prefix.into();
        self.expression_suffix = suffix.into();
        self
    }

    /// Map a literal to a line break.
    pub fn with_line_break_placeholder(mut self, literal: impl Into<String>) -> Self {
        self.line_break_placeholder = Some(literal.into());
        self
    }

    /// Enable lenient directive handling.
    pub fn lenient(mut self) -> Self {
        self.lenient_directives = true;
        self
    }

    /// Set the null rendering policy.
    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = policy;
        self
    }

    /// Set the `replaceWordWith(null)` policy.
    pub fn with_replace_word_null_policy(mut self, policy: ReplaceWordNullPolicy) -> Self {
        self.replace_word_null_policy = policy;
        self
    }

    /// Set the table fill policy.
    pub fn with_table_fill_policy(mut self, policy: TableFillPolicy) -> Self {
        self.table_fill_policy = policy;
        self
    }

    /// Set the date format.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Set the date-time format.
    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = format.into();
        self
    }

    /// Whether a failed expression is absorbed by a policy instead of
    /// aborting the stamp.
    pub fn recovers_unresolved(&self) -> bool {
        !self.fail_on_unresolved_expression
            || self.leave_empty_on_expression_error
            || self.replace_unresolved_expressions
    }

    /// Disable all structural cleanup passes.
    pub fn without_cleanup(mut self) -> Self {
        self.merge_similar_runs = false;
        self.strip_language = false;
        self.remove_orphan_notes = false;
        self
    }
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            fail_on_unresolved_expression: true,
            replace_unresolved_expressions: false,
            unresolved_expressions_default_value: String::new(),
            leave_empty_on_expression_error: false,
            expression_prefix: "${".to_string(),
            expression_suffix: "}".to_string(),
            line_break_placeholder: None,
            lenient_directives: false,
            null_policy: NullPolicy::Echo,
            replace_word_null_policy: ReplaceWordNullPolicy::KeepOriginal,
            table_fill_policy: TableFillPolicy::Lenient,
            date_format: "%Y-%m-%d".to_string(),
            date_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            merge_similar_runs: true,
            strip_language: true,
            remove_orphan_notes: true,
        }
    }
}

/// How a `null` expression result is written into the document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum NullPolicy {
    /// Keep the placeholder text as written
    #[default]
    Echo,
    /// Write nothing
    Empty,
    /// Write fixed text
    Text(String),
}

/// What `replaceWordWith(null)` does.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum ReplaceWordNullPolicy {
    /// Leave the run's content unchanged
    #[default]
    KeepOriginal,
    /// Clear the run
    Empty,
    /// Write fixed text
    Text(String),
}

/// Row/header mismatch handling when filling tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFillPolicy {
    /// Missing cells stay empty; extra values, and columns the template row
    /// has no cell for, are dropped
    #[default]
    Lenient,
    /// A row whose length differs from the header count, or a template row
    /// with fewer cells than the headers, is an error
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = StampConfig::new()
            .with_fail_on_unresolved(false)
            .replace_unresolved_with("N/A")
            .with_delimiters("#{", "}")
            .with_line_break_placeholder("<br>")
            .lenient();

        assert!(!config.fail_on_unresolved_expression);
        assert!(config.replace_unresolved_expressions);
        assert_eq!(config.unresolved_expressions_default_value, "N/A");
        assert_eq!(config.expression_prefix, "#{");
        assert_eq!(config.line_break_placeholder.as_deref(), Some("<br>"));
        assert!(config.lenient_directives);
        assert!(config.recovers_unresolved());
    }

    #[test]
    fn test_recovers_unresolved() {
        assert!(!StampConfig::default().recovers_unresolved());
        assert!(StampConfig::default().leave_empty_on_error(true).recovers_unresolved());
        assert!(StampConfig::default().replace_unresolved_with("?").recovers_unresolved());
        assert!(StampConfig::default().with_fail_on_unresolved(false).recovers_unresolved());
    }

    #[test]
    fn test_default_config() {
        let config = StampConfig::default();
        assert!(config.fail_on_unresolved_expression);
        assert!(!config.leave_empty_on_expression_error);
        assert_eq!(config.expression_prefix, "${");
        assert_eq!(config.expression_suffix, "}");
        assert_eq!(config.table_fill_policy, TableFillPolicy::Lenient);
        assert!(config.merge_similar_runs);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: StampConfig = serde_json::from_str(
            r#"{"leave_empty_on_expression_error": true, "null_policy": {"type": "text", "text": "-"}}"#,
        )
        .unwrap();
        assert!(config.leave_empty_on_expression_error);
        assert_eq!(config.null_policy, NullPolicy::Text("-".into()));
        assert!(config.fail_on_unresolved_expression);
    }
}
