// Analysis pipeline: normalize, classify, aggregate.
//
// The result of a run is a plain value handed back to the caller. Nothing is
// kept between runs; a session that wants to reuse reference data does so by
// sharing the (cached) source, not by holding on to a previous result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::classify::{self, ClassifyOptions, StockRecord};
use crate::distribution::{self, Dimension, Distribution};
use crate::error::Result;
use crate::input::{normalizer, NormalizedInput, StockCode};
use crate::progress::ProgressReporter;
use crate::reference::{Advisory, LoadedReference};
use crate::source::MarketDataSource;

/// Everything one analysis produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub generated_at: DateTime<Utc>,
    /// When the reference data was assembled, if known
    pub reference_built_at: Option<DateTime<Utc>>,
    pub records: Vec<StockRecord>,
    pub industry: Distribution,
    pub concept: Distribution,
    /// Codes missing from the stock name table
    pub not_found: Vec<StockCode>,
    /// Input tokens that were not stock codes
    pub invalid_tokens: Vec<String>,
    /// Reference data problems that may reduce accuracy
    pub advisories: Vec<Advisory>,
}

impl AnalysisResult {
    pub fn not_found_count(&self) -> usize {
        self.not_found.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.not_found.is_empty() || !self.invalid_tokens.is_empty() || !self.advisories.is_empty()
    }

    pub fn distribution(&self, dimension: Dimension) -> &Distribution {
        match dimension {
            Dimension::Industry => &self.industry,
            Dimension::Concept => &self.concept,
        }
    }

    /// Records whose code or name contains `term`, in record order. A blank
    /// term keeps every record.
    pub fn search(&self, term: &str) -> Vec<&StockRecord> {
        let term = term.trim();
        self.records
            .iter()
            .filter(|r| term.is_empty() || r.matches_search(term))
            .collect()
    }
}

/// Run a full analysis over already-normalized input.
///
/// Fails only on batch size validation, before any classification work.
pub async fn run(
    input: &NormalizedInput,
    reference: &LoadedReference,
    live: Option<&dyn MarketDataSource>,
    options: &ClassifyOptions,
    progress: &dyn ProgressReporter,
) -> Result<AnalysisResult> {
    normalizer::validate_batch(input)?;

    info!(
        codes = input.valid.len(),
        invalid = input.invalid.len(),
        "Starting analysis"
    );

    let batch = classify::classify(&input.valid, &reference.snapshot, live, options, progress).await;

    let industry = distribution::aggregate(&batch.records, Dimension::Industry);
    let concept = distribution::aggregate(&batch.records, Dimension::Concept);

    info!(
        industries = industry.buckets.len(),
        concepts = concept.buckets.len(),
        "Analysis complete"
    );

    Ok(AnalysisResult {
        generated_at: Utc::now(),
        reference_built_at: reference.snapshot.built_at(),
        records: batch.records,
        industry,
        concept,
        not_found: batch.not_found,
        invalid_tokens: input.invalid.clone(),
        advisories: reference.advisories.clone(),
    })
}

/// Normalize free text and run the analysis.
pub async fn run_text(
    text: &str,
    reference: &LoadedReference,
    live: Option<&dyn MarketDataSource>,
    options: &ClassifyOptions,
    progress: &dyn ProgressReporter,
) -> Result<AnalysisResult> {
    let input = normalizer::normalize(text);
    run(&input, reference, live, options, progress).await
}
