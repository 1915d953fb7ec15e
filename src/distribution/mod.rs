// Distribution aggregation: counting records per industry and per concept.
//
// A Distribution is derived entirely from a record batch and never updated in
// place. Buckets keep first-encounter order; `ranked` and `for_display` give
// the frequency-sorted views used for reporting.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Serialize;

use crate::classify::StockRecord;
use crate::input::StockCode;

/// Label of the synthetic bucket holding folded low-frequency labels.
pub const OTHER_LABEL: &str = "other";

/// Above this many labels, the display view folds the tail into "other".
pub const DISPLAY_LABEL_LIMIT: usize = 10;

/// Labels kept before folding.
pub const DISPLAY_KEEP: usize = 9;

/// Which record field to aggregate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Industry,
    Concept,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Industry => "industry",
            Dimension::Concept => "concept",
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "industry" => Ok(Dimension::Industry),
            "concept" => Ok(Dimension::Concept),
            other => Err(format!("unknown dimension '{other}' (expected industry or concept)")),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stock counted in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketMember {
    pub code: StockCode,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub label: String,
    pub count: usize,
    /// One entry per contributing record, in record order
    pub members: Vec<BucketMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub dimension: Dimension,
    /// Buckets in first-encounter order
    pub buckets: Vec<DistributionBucket>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of all bucket counts (records for industries, mentions for concepts).
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Label -> count, in encounter order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.buckets
            .iter()
            .map(|b| (b.label.as_str(), b.count))
            .collect()
    }

    pub fn bucket(&self, label: &str) -> Option<&DistributionBucket> {
        self.buckets.iter().find(|b| b.label == label)
    }

    /// The stocks counted under `label`.
    pub fn members(&self, label: &str) -> Option<&[BucketMember]> {
        self.bucket(label).map(|b| b.members.as_slice())
    }

    /// Label -> member list for every bucket.
    pub fn reverse_index(&self) -> HashMap<&str, &[BucketMember]> {
        self.buckets
            .iter()
            .map(|b| (b.label.as_str(), b.members.as_slice()))
            .collect()
    }

    /// All buckets, highest count first; ties keep encounter order.
    pub fn ranked(&self) -> Vec<&DistributionBucket> {
        let mut ranked: Vec<&DistributionBucket> = self.buckets.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    /// Buckets for a chart or summary table: the top nine plus "other" when
    /// there are more than ten labels, otherwise every bucket in encounter
    /// order.
    pub fn for_display(&self) -> Vec<DistributionBucket> {
        fold_tail(&self.buckets, DISPLAY_LABEL_LIMIT, DISPLAY_KEEP)
    }

    /// The displayed buckets ordered for picking one: largest first, with a
    /// folded "other" always last.
    pub fn selectable(&self) -> Vec<DistributionBucket> {
        let folded = self.buckets.len() > DISPLAY_LABEL_LIMIT;
        let mut shown = self.for_display();
        shown.sort_by_key(|b| (folded && b.label == OTHER_LABEL, Reverse(b.count)));
        shown
    }

    /// Look up one bucket by label for a member listing.
    ///
    /// "other" resolves to the folded bucket of the display view. Labels
    /// folded into "other" can still be picked by name.
    pub fn display_bucket(&self, label: &str) -> Option<DistributionBucket> {
        self.selectable()
            .into_iter()
            .find(|b| b.label == label)
            .or_else(|| self.bucket(label).cloned())
    }
}

/// Tally records along one dimension.
///
/// Sentinel values ("unknown industry", an empty concept list) contribute
/// nothing.
pub fn aggregate(records: &[StockRecord], dimension: Dimension) -> Distribution {
    let mut buckets: Vec<DistributionBucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let labels: &[String] = match dimension {
            Dimension::Industry if record.has_known_industry() => {
                std::slice::from_ref(&record.industry)
            }
            Dimension::Industry => &[],
            Dimension::Concept => &record.concepts,
        };

        for label in labels {
            let pos = *positions.entry(label.clone()).or_insert_with(|| {
                buckets.push(DistributionBucket {
                    label: label.clone(),
                    count: 0,
                    members: Vec::new(),
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[pos];
            bucket.count += 1;
            bucket.members.push(BucketMember {
                code: record.code.clone(),
                name: record.display_name.clone(),
            });
        }
    }

    Distribution { dimension, buckets }
}

/// Keep the `keep` largest buckets and fold the rest into "other" when there
/// are more than `limit` buckets.
///
/// Ranking is by count, ties in input order. The folded bucket's members
/// are concatenated in ranked order and it always comes last.
pub fn fold_tail(buckets: &[DistributionBucket], limit: usize, keep: usize) -> Vec<DistributionBucket> {
    if buckets.len() <= limit {
        return buckets.to_vec();
    }

    let mut ranked: Vec<&DistributionBucket> = buckets.iter().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));

    let (head, tail) = ranked.split_at(keep.min(ranked.len()));
    let mut out: Vec<DistributionBucket> = head.iter().map(|b| (*b).clone()).collect();

    let other = DistributionBucket {
        label: OTHER_LABEL.to_string(),
        count: tail.iter().map(|b| b.count).sum(),
        members: tail.iter().flat_map(|b| b.members.iter().cloned()).collect(),
    };
    if other.count > 0 {
        out.push(other);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: usize, code: &str, industry: &str, concepts: &[&str]) -> StockRecord {
        StockRecord {
            sequence_number: seq,
            code: StockCode::parse(code).unwrap(),
            display_name: format!("Stock {code}"),
            industry: industry.to_string(),
            concepts: concepts.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn bucket(label: &str, count: usize) -> DistributionBucket {
        DistributionBucket {
            label: label.to_string(),
            count,
            members: Vec::new(),
        }
    }

    #[test]
    fn test_reverse_index_skips_records_without_concepts() {
        let records = vec![
            record(1, "600519", "Liquor", &["Consumption", "Dividend"]),
            record(2, "000858", "Liquor", &["Consumption"]),
            record(3, "300750", "Batteries", &[]),
        ];
        let dist = aggregate(&records, Dimension::Concept);
        assert_eq!(dist.reverse_index().len(), 2);
        assert!(dist
            .reverse_index()
            .values()
            .all(|members| members.iter().all(|m| m.code.as_str() != "300750")));
    }

    #[test]
    fn test_fold_ties_keep_encounter_order() {
        let mut buckets: Vec<_> = (0..11).map(|i| bucket(&format!("L{i}"), 1)).collect();
        buckets.push(bucket("Big", 5));
        let shown = fold_tail(&buckets, 10, 9);
        let labels: Vec<&str> = shown.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Big", "L0", "L1", "L2", "L3", "L4", "L5", "L6", "L7", "other"]
        );
        assert_eq!(shown[9].count, 3);
    }
}
