// StockRecord: the per-code classification result.

use serde::Serialize;

use crate::input::StockCode;

/// Shown when a code is missing from the stock name table.
pub const UNKNOWN_STOCK: &str = "unknown stock";

/// Shown when neither the industry catalog nor the live lookup knows a code.
pub const UNKNOWN_INDUSTRY: &str = "unknown industry";

/// Shown in place of an empty concept list.
pub const NO_RELATED_CONCEPTS: &str = "no related concepts";

/// One classified input code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    /// 1-based position among the valid input codes
    pub sequence_number: usize,
    pub code: StockCode,
    pub display_name: String,
    pub industry: String,
    /// Most relevant first, at most five. Empty means no concept matched.
    pub concepts: Vec<String>,
}

impl StockRecord {
    pub fn has_known_industry(&self) -> bool {
        self.industry != UNKNOWN_INDUSTRY
    }

    /// Whether the code or the display name contains `term`.
    pub fn matches_search(&self, term: &str) -> bool {
        self.code.as_str().contains(term) || self.display_name.contains(term)
    }

    /// Concepts joined for display, or the sentinel when there are none.
    pub fn concepts_label(&self) -> String {
        if self.concepts.is_empty() {
            NO_RELATED_CONCEPTS.to_string()
        } else {
            self.concepts.join(", ")
        }
    }
}
