//! Section properties.

use serde::{Deserialize, Serialize};

/// Layout of a document section. Attached to the paragraph that ends the
/// section, or to the document for the final section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// How the section starts relative to the previous one
    pub break_type: SectionBreakType,

    /// Page width in twips
    pub page_width: Option<u32>,

    /// Page height in twips
    pub page_height: Option<u32>,

    /// Page orientation
    pub orientation: Orientation,

    /// Number of text columns
    pub columns: u8,
}

impl SectionProperties {
    /// Create properties for a section of the given break type.
    pub fn new(break_type: SectionBreakType) -> Self {
        Self {
            break_type,
            columns: 1,
            ..Default::default()
        }
    }

    /// Set the column count and return self.
    pub fn with_columns(mut self, columns: u8) -> Self {
        self.columns = columns;
        self
    }
}

/// Section start type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBreakType {
    /// Start on a new page
    #[default]
    NextPage,
    /// Start on the same page
    Continuous,
    /// Start on the next even page
    EvenPage,
    /// Start on the next odd page
    OddPage,
    /// Start in the next column
    NextColumn,
}

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait (default)
    #[default]
    Portrait,
    /// Landscape
    Landscape,
}
