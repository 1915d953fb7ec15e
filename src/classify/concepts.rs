// Concept relevance scoring.
//
// A stock typically belongs to dozens of concept boards, most of them noise
// for the purpose of "what is this company about". Each matching concept gets
// a composite relevance score and only the top five are kept:
//
//   relevance = weight_score + precision_score + heat_score
//
//   weight_score    = (N - rank) * 0.5          earlier boards in the source
//                                                listing are the popular ones
//   precision_score = precision(members) * 0.5  mid-sized boards (30-100
//                                                members) say the most
//   heat_score      = min(|change| * 5, 100) * 0.2
//                                                boards moving today, when the
//                                                change rate is known
//
// Ties keep catalog order (the sort is stable); there is no secondary key.

use serde::Serialize;

use crate::reference::{CatalogEntry, ReferenceSnapshot};

/// Boards smaller than this score their member count as precision.
pub const PRECISION_LOWER_BOUND: usize = 30;

/// Boards up to this size still get full precision.
pub const PRECISION_UPPER_BOUND: usize = 100;

/// Coefficients for the relevance formula.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptWeights {
    /// Multiplier on the catalog-position weight (default 0.5)
    pub rank_factor: f64,
    /// Multiplier on the board-size precision (default 0.5)
    pub precision_factor: f64,
    /// Multiplier on the capped heat value (default 0.2)
    pub heat_factor: f64,
    /// Heat per percentage point of absolute change (default 5.0)
    pub heat_per_percent: f64,
    /// Cap on heat before the multiplier (default 100.0)
    pub heat_cap: f64,
    /// How many concept names to keep per stock (default 5)
    pub max_concepts: usize,
}

impl Default for ConceptWeights {
    fn default() -> Self {
        Self {
            rank_factor: 0.5,
            precision_factor: 0.5,
            heat_factor: 0.2,
            heat_per_percent: 5.0,
            heat_cap: 100.0,
            max_concepts: 5,
        }
    }
}

/// A concept matching one stock, with its score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch<'a> {
    pub name: &'a str,
    pub score: f64,
    pub weight_score: f64,
    pub precision_score: f64,
    pub heat_score: f64,
}

/// Raw precision for a board of `member_count` stocks (before the factor).
pub fn precision(member_count: usize) -> f64 {
    if member_count < PRECISION_LOWER_BOUND {
        member_count as f64
    } else if member_count <= PRECISION_UPPER_BOUND {
        100.0
    } else {
        (200.0 - member_count as f64).max(1.0)
    }
}

/// Score one concept board, given the catalog size.
pub fn score_entry<'a>(
    entry: &'a CatalogEntry,
    catalog_len: usize,
    weights: &ConceptWeights,
) -> ScoredMatch<'a> {
    let weight = catalog_len.saturating_sub(entry.rank) as f64;
    let weight_score = weight * weights.rank_factor;
    let precision_score = precision(entry.members.len()) * weights.precision_factor;
    let heat_score = entry
        .change_rate
        .filter(|r| r.is_finite())
        .map(|r| (r.abs() * weights.heat_per_percent).min(weights.heat_cap) * weights.heat_factor)
        .unwrap_or(0.0);

    ScoredMatch {
        name: &entry.name,
        score: weight_score + precision_score + heat_score,
        weight_score,
        precision_score,
        heat_score,
    }
}

/// Every concept containing `code`, scored and sorted most relevant first.
pub fn score_matches<'a>(
    code: &str,
    snapshot: &'a ReferenceSnapshot,
    weights: &ConceptWeights,
) -> Vec<ScoredMatch<'a>> {
    let catalog_len = snapshot.concepts().len();
    let mut matches: Vec<ScoredMatch<'a>> = snapshot
        .concepts_for(code)
        .map(|entry| score_entry(entry, catalog_len, weights))
        .collect();

    // Stable: equal scores stay in catalog order.
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

/// The most relevant concept names for `code`, at most `max_concepts`.
/// Empty when the code is in no concept board.
pub fn score(code: &str, snapshot: &ReferenceSnapshot, weights: &ConceptWeights) -> Vec<String> {
    score_matches(code, snapshot, weights)
        .into_iter()
        .take(weights.max_concepts)
        .map(|m| m.name.to_string())
        .collect()
}
