// Batch classifier: one StockRecord per input code.
//
// Codes are independent of each other, so the batch is mapped through a
// bounded `buffered` stream. Only the live industry fallback does I/O; the
// rest is snapshot lookups. `buffered` yields results in submission order,
// which keeps records in sequence-number order regardless of which live
// lookup returns first.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use super::concepts::{self, ConceptWeights};
use super::industry;
use super::record::{StockRecord, UNKNOWN_STOCK};
use crate::input::StockCode;
use crate::progress::ProgressReporter;
use crate::reference::ReferenceSnapshot;
use crate::source::MarketDataSource;

/// Default number of codes classified concurrently.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default bound on a single live industry lookup.
pub const DEFAULT_LIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning knobs for a batch run.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub concurrency: usize,
    pub live_timeout: Duration,
    pub concept_weights: ConceptWeights,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            live_timeout: DEFAULT_LIVE_TIMEOUT,
            concept_weights: ConceptWeights::default(),
        }
    }
}

/// Records in input order plus the codes missing from the name table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifiedBatch {
    pub records: Vec<StockRecord>,
    /// Each unnamed code once, in first-seen order
    pub not_found: Vec<StockCode>,
}

/// Classify every code against the snapshot.
///
/// `live` enables the industry fallback lookup; pass `None` for offline runs.
pub async fn classify(
    codes: &[StockCode],
    snapshot: &ReferenceSnapshot,
    live: Option<&dyn MarketDataSource>,
    options: &ClassifyOptions,
    progress: &dyn ProgressReporter,
) -> ClassifiedBatch {
    let total = codes.len();
    progress.start("Classifying stocks", total);

    let mut records = stream::iter(codes.iter().enumerate().map(|(i, code)| {
        classify_one(i + 1, code, snapshot, live, options)
    }))
    .buffered(options.concurrency.max(1));

    let mut batch = ClassifiedBatch {
        records: Vec::with_capacity(total),
        not_found: Vec::new(),
    };
    let mut unnamed: HashSet<&StockCode> = HashSet::new();

    while let Some(record) = records.next().await {
        if snapshot.display_name(record.code.as_str()).is_none() {
            let code = &codes[record.sequence_number - 1];
            if unnamed.insert(code) {
                batch.not_found.push(code.clone());
            }
        }
        batch.records.push(record);
        progress.advance(batch.records.len());
    }
    progress.finish();

    if !batch.not_found.is_empty() {
        warn!(
            count = batch.not_found.len(),
            "Some codes are missing from the stock name table"
        );
    }
    info!(records = batch.records.len(), "Batch classified");

    batch
}

/// Classify a single code.
pub async fn classify_one(
    sequence_number: usize,
    code: &StockCode,
    snapshot: &ReferenceSnapshot,
    live: Option<&dyn MarketDataSource>,
    options: &ClassifyOptions,
) -> StockRecord {
    let display_name = snapshot
        .display_name(code.as_str())
        .unwrap_or(UNKNOWN_STOCK)
        .to_string();
    let industry = industry::resolve(code, snapshot, live, options.live_timeout).await;
    let concepts = concepts::score(code.as_str(), snapshot, &options.concept_weights);

    StockRecord {
        sequence_number,
        code: code.clone(),
        display_name,
        industry,
        concepts,
    }
}
