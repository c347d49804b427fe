//! Stamping statistics.

use serde::{Deserialize, Serialize};

/// Statistics collected while stamping a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampReport {
    /// Placeholders replaced with resolved content
    pub expressions_resolved: u32,

    /// Placeholders whose failure was absorbed by a configured policy
    pub expressions_recovered: u32,

    /// Directive invocations dispatched to a processor
    pub directives_applied: u32,

    /// Comments left in place because their directives were skipped
    pub directives_skipped: u32,

    /// Paragraphs removed by conditional directives
    pub paragraphs_removed: u32,

    /// Table rows removed by conditional directives
    pub rows_removed: u32,

    /// Tables removed by conditional directives or a null table value
    pub tables_removed: u32,

    /// Blocks generated by paragraph repetition
    pub blocks_repeated: u32,

    /// Runs rewritten by `replaceWordWith`
    pub words_replaced: u32,

    /// Tables populated from table data
    pub tables_filled: u32,

    /// Runs absorbed into a neighbour with the same formatting
    pub runs_merged: u32,

    /// Footnotes and endnotes no longer referenced from the body
    pub notes_removed: u32,
}

impl StampReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one resolved placeholder.
    pub fn add_resolved(&mut self) {
        self.expressions_resolved += 1;
    }

    /// Count one placeholder recovered by policy.
    pub fn add_recovered(&mut self) {
        self.expressions_recovered += 1;
    }

    /// Count the placeholders of one replacement pass.
    pub fn add_expressions(&mut self, resolved: u32, recovered: u32) {
        self.expressions_resolved += resolved;
        self.expressions_recovered += recovered;
    }

    /// Count one dispatched directive.
    pub fn add_directive(&mut self) {
        self.directives_applied += 1;
    }

    /// Total number of structural removals.
    pub fn removals(&self) -> u32 {
        self.paragraphs_removed + self.rows_removed + self.tables_removed
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: &StampReport) {
        self.expressions_resolved += other.expressions_resolved;
        self.expressions_recovered += other.expressions_recovered;
        self.directives_applied += other.directives_applied;
        self.directives_skipped += other.directives_skipped;
        self.paragraphs_removed += other.paragraphs_removed;
        self.rows_removed += other.rows_removed;
        self.tables_removed += other.tables_removed;
        self.blocks_repeated += other.blocks_repeated;
        self.words_replaced += other.words_replaced;
        self.tables_filled += other.tables_filled;
        self.runs_merged += other.runs_merged;
        self.notes_removed += other.notes_removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut report = StampReport::new();
        report.add_resolved();
        report.paragraphs_removed = 2;

        let other = StampReport {
            expressions_resolved: 3,
            rows_removed: 1,
            notes_removed: 4,
            ..Default::default()
        };
        report.merge(&other);

        assert_eq!(report.expressions_resolved, 4);
        assert_eq!(report.removals(), 3);
        assert_eq!(report.notes_removed, 4);
    }

    #[test]
    fn test_report_serializes() {
        let mut report = StampReport::new();
        report.add_directive();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"directives_applied\":1"));
    }
}
