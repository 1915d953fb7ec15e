// Colored terminal output for analysis results and catalogs.
//
// This module handles all terminal-specific formatting. main.rs decides what
// to show and delegates the drawing here.

use colored::Colorize;

use super::{pad_right, truncate_chars};
use crate::analysis::AnalysisResult;
use crate::classify::{ScoredMatch, StockRecord};
use crate::distribution::{Dimension, Distribution, DistributionBucket, OTHER_LABEL};
use crate::reference::{Advisory, CatalogEntry, ClassificationKind};

const BAR_WIDTH: usize = 24;

/// Display the per-stock classification table.
///
/// `search` names the filter that produced `records`, if any.
pub fn display_records(records: &[&StockRecord], search: Option<&str>) {
    let title = match search {
        Some(term) => format!(
            "=== Stock Classification ({} stocks matching \"{term}\") ===",
            records.len()
        ),
        None => format!("=== Stock Classification ({} stocks) ===", records.len()),
    };
    println!("\n{}", title.bold());

    if records.is_empty() {
        println!("  {}", "No matching stocks".dimmed());
        return;
    }
    println!();

    println!(
        "  {:>4}  {:<6}  {}  {}  {}",
        "#".dimmed(),
        "Code".dimmed(),
        pad_right("Name", 16).dimmed(),
        pad_right("Industry", 18).dimmed(),
        "Concepts".dimmed(),
    );
    println!("  {}", "-".repeat(96).dimmed());

    for record in records.iter().copied() {
        let name = pad_right(&truncate_chars(&record.display_name, 7), 16);
        let industry = pad_right(&truncate_chars(&record.industry, 8), 18);
        let concepts = truncate_chars(&record.concepts_label(), 60);

        let name = if record.display_name == crate::classify::UNKNOWN_STOCK {
            name.yellow()
        } else {
            name.normal()
        };
        let industry = if record.has_known_industry() {
            industry.cyan()
        } else {
            industry.dimmed()
        };
        let concepts = if record.concepts.is_empty() {
            concepts.dimmed()
        } else {
            concepts.normal()
        };

        println!(
            "  {:>4}  {:<6}  {}  {}  {}",
            record.sequence_number, record.code, name, industry, concepts
        );
    }
}

/// Display one distribution as a bar table.
///
/// The compact view shows the top nine labels plus "other"; `full` lists
/// every label by count.
pub fn display_distribution(title: &str, distribution: &Distribution, full: bool) {
    println!("\n{}", format!("=== {title} ===").bold());

    if distribution.is_empty() {
        println!("  {}", "No data".dimmed());
        return;
    }

    let buckets: Vec<DistributionBucket> = if full {
        distribution.ranked().into_iter().cloned().collect()
    } else {
        distribution.for_display()
    };

    let total: usize = buckets.iter().map(|b| b.count).sum();
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    println!();

    for bucket in &buckets {
        let share = if total == 0 {
            0.0
        } else {
            100.0 * bucket.count as f64 / total as f64
        };
        let filled = if max == 0 {
            0
        } else {
            (bucket.count as f64 / max as f64 * BAR_WIDTH as f64).round() as usize
        };
        let bar = format!(
            "{}{}",
            "=".repeat(filled),
            " ".repeat(BAR_WIDTH.saturating_sub(filled))
        );
        let bar = if bucket.label == OTHER_LABEL {
            bar.dimmed()
        } else if share >= 20.0 {
            bar.red()
        } else if share >= 10.0 {
            bar.yellow()
        } else {
            bar.green()
        };

        println!(
            "  {} [{}] {:>4}  {:>5.1}%",
            pad_right(&truncate_chars(&bucket.label, 10), 24),
            bar,
            bucket.count,
            share
        );
    }

    if !full && distribution.buckets.len() > buckets.len() {
        println!(
            "\n  {}",
            format!(
                "{} labels in total; the smallest are grouped under \"{OTHER_LABEL}\".",
                distribution.buckets.len()
            )
            .dimmed()
        );
    }
}

/// List the stocks counted under one label.
pub fn display_bucket_members(dimension: Dimension, bucket: &DistributionBucket) {
    println!(
        "\n{}",
        format!(
            "=== {} \"{}\" ({} stocks) ===",
            dimension, bucket.label, bucket.count
        )
        .bold()
    );
    if bucket.members.is_empty() {
        println!("  {}", "No stocks".dimmed());
        return;
    }
    for member in &bucket.members {
        println!("  {}  {}", member.code, member.name);
    }
}

/// Report a label that is not in the distribution, with the ones that are.
pub fn display_unknown_label(dimension: Dimension, label: &str, available: &[DistributionBucket]) {
    println!(
        "\n  {} No {dimension} named \"{label}\" in this batch.",
        "Warning:".yellow()
    );
    if available.is_empty() {
        return;
    }
    let choices: Vec<String> = available
        .iter()
        .map(|b| format!("{} ({})", b.label, b.count))
        .collect();
    println!("  {}", format!("Available: {}", choices.join(", ")).dimmed());
}

/// Display non-fatal warnings: invalid input, unnamed codes, reference gaps.
pub fn display_warnings(result: &AnalysisResult) {
    if !result.has_warnings() {
        return;
    }
    println!();

    display_invalid_tokens(&result.invalid_tokens);

    if !result.not_found.is_empty() {
        let codes: Vec<String> = result.not_found.iter().map(|c| c.to_string()).collect();
        println!(
            "  {} {} codes not found in the stock list: {}",
            "Warning:".yellow(),
            result.not_found_count(),
            codes.join(", ")
        );
    }

    display_advisories(&result.advisories);
}

/// Display the input tokens that were not stock codes.
pub fn display_invalid_tokens(tokens: &[String]) {
    if let Some(line) = invalid_tokens_line(tokens) {
        println!("  {} {line}", "Warning:".yellow());
    }
}

fn invalid_tokens_line(tokens: &[String]) -> Option<String> {
    if tokens.is_empty() {
        None
    } else {
        Some(format!("Ignored invalid codes: {}", tokens.join(", ")))
    }
}

/// Display reference data problems, at most ten of them.
pub fn display_advisories(advisories: &[Advisory]) {
    if advisories.is_empty() {
        return;
    }
    println!(
        "  {} Reference data is incomplete ({} problems); results may miss some classifications:",
        "Warning:".yellow(),
        advisories.len()
    );
    for advisory in advisories.iter().take(10) {
        println!("    - {}", advisory.to_string().dimmed());
    }
    if advisories.len() > 10 {
        println!(
            "    {}",
            format!("... and {} more", advisories.len() - 10).dimmed()
        );
    }
}

/// Display the score breakdown behind one record's concepts.
pub fn display_explain(record: &StockRecord, matches: &[ScoredMatch<'_>], keep: usize) {
    println!(
        "\n{}",
        format!(
            "=== Concept scores for {} {} ({} matches) ===",
            record.code,
            record.display_name,
            matches.len()
        )
        .bold()
    );

    if matches.is_empty() {
        println!("  {}", crate::classify::NO_RELATED_CONCEPTS.dimmed());
        return;
    }

    println!(
        "  {:>4}  {}  {:>7}  {:>7}  {:>9}  {:>5}",
        "Rank".dimmed(),
        pad_right("Concept", 24).dimmed(),
        "Score".dimmed(),
        "Weight".dimmed(),
        "Precision".dimmed(),
        "Heat".dimmed(),
    );

    for (i, m) in matches.iter().enumerate() {
        let line = format!(
            "  {:>4}  {}  {:>7.1}  {:>7.1}  {:>9.1}  {:>5.1}",
            i + 1,
            pad_right(&truncate_chars(m.name, 10), 24),
            m.score,
            m.weight_score,
            m.precision_score,
            m.heat_score
        );
        if i < keep {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

/// Display a catalog listing.
pub fn display_catalog(kind: ClassificationKind, entries: &[CatalogEntry], limit: usize) {
    println!(
        "\n{}",
        format!("=== {} catalog ({} boards) ===", kind, entries.len()).bold()
    );
    println!();
    println!(
        "  {:>5}  {}  {:>8}  {:>7}",
        "Rank".dimmed(),
        pad_right("Board", 24).dimmed(),
        "Change".dimmed(),
        "Members".dimmed(),
    );

    for entry in entries.iter().take(limit) {
        let change = match entry.change_rate {
            Some(r) if r > 0.0 => format!("{r:+.2}%").red(),
            Some(r) if r < 0.0 => format!("{r:+.2}%").green(),
            Some(r) => format!("{r:.2}%").normal(),
            None => "-".dimmed(),
        };
        println!(
            "  {:>5}  {}  {:>8}  {:>7}",
            entry.rank + 1,
            pad_right(&truncate_chars(&entry.name, 10), 24),
            change,
            entry.members.len()
        );
    }

    if entries.len() > limit {
        println!(
            "\n  {}",
            format!("... {} more (use --limit to show more)", entries.len() - limit).dimmed()
        );
    }
}
