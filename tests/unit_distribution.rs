// Unit tests for distribution aggregation and display folding.
//
// Tests counting rules (sentinels skipped, one mention per concept),
// idempotence, the top-nine plus "other" fold and its tie handling.

use sectorscope::classify::{StockRecord, UNKNOWN_INDUSTRY};
use sectorscope::distribution::{
    aggregate, fold_tail, BucketMember, Dimension, DistributionBucket, DISPLAY_KEEP,
    DISPLAY_LABEL_LIMIT, OTHER_LABEL,
};
use sectorscope::input::StockCode;

fn record(seq: usize, code: &str, industry: &str, concepts: &[&str]) -> StockRecord {
    StockRecord {
        sequence_number: seq,
        code: StockCode::parse(code).unwrap(),
        display_name: format!("Name {code}"),
        industry: industry.to_string(),
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
    }
}

fn buckets(counts: &[usize]) -> Vec<DistributionBucket> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| DistributionBucket {
            label: format!("L{i}"),
            count,
            members: Vec::new(),
        })
        .collect()
}

/// 21 records over twelve industries: I0..I8 hold two stocks each, I9..I11
/// one each.
fn twelve_industries() -> Vec<StockRecord> {
    (1..=21)
        .map(|k| {
            let industry = if k <= 18 {
                format!("I{}", (k - 1) / 2)
            } else {
                format!("I{}", k - 10)
            };
            record(k, &format!("{k:06}"), &industry, &[])
        })
        .collect()
}

fn member_codes(bucket: &DistributionBucket) -> Vec<&str> {
    bucket.members.iter().map(|m| m.code.as_str()).collect()
}

fn sample() -> Vec<StockRecord> {
    vec![
        record(1, "600519", "Liquor", &["Consumption", "Dividend"]),
        record(2, "000858", "Liquor", &["Consumption"]),
        record(3, "002594", "Autos", &["New Energy", "Consumption"]),
        record(4, "688981", UNKNOWN_INDUSTRY, &[]),
        record(5, "600519", "Liquor", &["Consumption", "Dividend"]),
    ]
}

// ============================================================
// aggregate: counting
// ============================================================

#[test]
fn industry_counts_in_encounter_order() {
    let dist = aggregate(&sample(), Dimension::Industry);
    assert_eq!(dist.counts(), vec![("Liquor", 3), ("Autos", 1)]);
}

#[test]
fn unknown_industry_never_counted() {
    let dist = aggregate(&sample(), Dimension::Industry);
    assert!(dist.bucket(UNKNOWN_INDUSTRY).is_none());
    assert_eq!(dist.total(), 4);
}

#[test]
fn each_concept_mention_counts_once() {
    let dist = aggregate(&sample(), Dimension::Concept);
    assert_eq!(
        dist.counts(),
        vec![("Consumption", 4), ("Dividend", 2), ("New Energy", 1)]
    );
}

#[test]
fn empty_concepts_contribute_nothing() {
    let records = vec![record(1, "688981", "Chips", &[])];
    let dist = aggregate(&records, Dimension::Concept);
    assert!(dist.is_empty());
}

#[test]
fn repeated_codes_counted_per_record() {
    let dist = aggregate(&sample(), Dimension::Industry);
    let liquor = dist.members("Liquor").unwrap();
    let codes: Vec<&str> = liquor.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(codes, vec!["600519", "000858", "600519"]);
}

#[test]
fn aggregation_is_idempotent() {
    let records = sample();
    assert_eq!(
        aggregate(&records, Dimension::Concept),
        aggregate(&records, Dimension::Concept)
    );
    assert_eq!(
        aggregate(&records, Dimension::Industry),
        aggregate(&records, Dimension::Industry)
    );
}

#[test]
fn ranked_orders_by_count() {
    let records = vec![
        record(1, "000001", "Banks", &[]),
        record(2, "600519", "Liquor", &[]),
        record(3, "000858", "Liquor", &[]),
    ];
    let dist = aggregate(&records, Dimension::Industry);
    let labels: Vec<&str> = dist.ranked().iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Liquor", "Banks"]);
}

// ============================================================
// fold_tail: display bucketing
// ============================================================

#[test]
fn display_constants() {
    assert_eq!(DISPLAY_LABEL_LIMIT, 10);
    assert_eq!(DISPLAY_KEEP, 9);
}

#[test]
fn twelve_labels_fold_into_other() {
    let shown = fold_tail(
        &buckets(&[50, 40, 30, 25, 20, 15, 10, 8, 5, 3, 2, 1]),
        DISPLAY_LABEL_LIMIT,
        DISPLAY_KEEP,
    );
    assert_eq!(shown.len(), 10);
    assert_eq!(shown[9].label, OTHER_LABEL);
    assert_eq!(shown[9].count, 6);
    let total: usize = shown.iter().map(|b| b.count).sum();
    assert_eq!(total, 209);
}

#[test]
fn fold_sorts_unsorted_input() {
    let shown = fold_tail(
        &buckets(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
        DISPLAY_LABEL_LIMIT,
        DISPLAY_KEEP,
    );
    let counts: Vec<usize> = shown.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![11, 10, 9, 8, 7, 6, 5, 4, 3, 3]);
    assert_eq!(shown.last().unwrap().label, OTHER_LABEL);
}

#[test]
fn ten_labels_shown_unchanged() {
    let input = buckets(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    let shown = fold_tail(&input, DISPLAY_LABEL_LIMIT, DISPLAY_KEEP);
    assert_eq!(shown, input);
}

#[test]
fn smallest_labels_fold_first() {
    let mut input = vec![
        DistributionBucket {
            label: "Small".to_string(),
            count: 1,
            members: vec![],
        },
        DistributionBucket {
            label: "Smaller".to_string(),
            count: 1,
            members: vec![],
        },
    ];
    input.extend(buckets(&[9; 9]));
    let shown = fold_tail(&input, DISPLAY_LABEL_LIMIT, DISPLAY_KEEP);
    assert_eq!(shown.len(), 10);
    assert!(shown.iter().all(|b| b.label != "Small" && b.label != "Smaller"));
    assert_eq!(shown[9].count, 2);
}

#[test]
fn display_view_of_small_distribution_matches_buckets() {
    let dist = aggregate(&sample(), Dimension::Concept);
    assert_eq!(dist.for_display(), dist.buckets);
}

#[test]
fn other_bucket_lists_folded_members_in_rank_order() {
    let dist = aggregate(&twelve_industries(), Dimension::Industry);
    let shown = dist.for_display();
    assert_eq!(shown.len(), 10);

    let other = &shown[9];
    assert_eq!(other.label, OTHER_LABEL);
    assert_eq!(other.count, 3);
    assert_eq!(member_codes(other), vec!["000019", "000020", "000021"]);
}

#[test]
fn other_members_concatenate_folded_buckets() {
    let member = |code: &str| BucketMember {
        code: StockCode::parse(code).unwrap(),
        name: format!("Name {code}"),
    };
    let mut input = buckets(&[5; 9]);
    input.push(DistributionBucket {
        label: "Tail A".to_string(),
        count: 1,
        members: vec![member("000002")],
    });
    input.push(DistributionBucket {
        label: "Tail B".to_string(),
        count: 2,
        members: vec![member("000003"), member("000001")],
    });

    let shown = fold_tail(&input, DISPLAY_LABEL_LIMIT, DISPLAY_KEEP);
    let other = shown.last().unwrap();
    assert_eq!(other.count, 3);
    // Tail B outranks Tail A, so its members come first
    assert_eq!(member_codes(other), vec!["000003", "000001", "000002"]);
}

// ============================================================
// display_bucket: picking a label to list
// ============================================================

#[test]
fn selectable_puts_other_last() {
    let mut records = twelve_industries();
    // Grow I9 past the paired industries
    records.extend((22..=24).map(|k| record(k, &format!("{k:06}"), "I9", &[])));
    let dist = aggregate(&records, Dimension::Industry);

    let labels: Vec<String> = dist.selectable().into_iter().map(|b| b.label).collect();
    assert_eq!(labels.len(), 10);
    assert_eq!(labels[0], "I9");
    assert_eq!(labels[9], OTHER_LABEL);
}

#[test]
fn selectable_unfolded_is_largest_first() {
    let dist = aggregate(&sample(), Dimension::Concept);
    let labels: Vec<String> = dist.selectable().into_iter().map(|b| b.label).collect();
    assert_eq!(labels, vec!["Consumption", "Dividend", "New Energy"]);
}

#[test]
fn other_resolves_to_folded_bucket() {
    let dist = aggregate(&twelve_industries(), Dimension::Industry);
    let other = dist.display_bucket(OTHER_LABEL).unwrap();
    assert_eq!(other.count, 3);
    assert_eq!(member_codes(&other), vec!["000019", "000020", "000021"]);
}

#[test]
fn folded_label_can_still_be_picked() {
    let dist = aggregate(&twelve_industries(), Dimension::Industry);
    let bucket = dist.display_bucket("I10").unwrap();
    assert_eq!(member_codes(&bucket), vec!["000020"]);

    let bucket = dist.display_bucket("I0").unwrap();
    assert_eq!(member_codes(&bucket), vec!["000001", "000002"]);
}

#[test]
fn missing_label_is_none() {
    let dist = aggregate(&sample(), Dimension::Industry);
    assert!(dist.display_bucket("Banks").is_none());
    // No fold, so "other" is not a bucket
    assert!(dist.display_bucket(OTHER_LABEL).is_none());
}

#[test]
fn dimension_parses_from_text() {
    assert_eq!("industry".parse::<Dimension>(), Ok(Dimension::Industry));
    assert_eq!("Concept".parse::<Dimension>(), Ok(Dimension::Concept));
    assert!("sector".parse::<Dimension>().is_err());
}
