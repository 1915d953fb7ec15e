// Typed errors for the analysis pipeline.
//
// Only input validation is fatal for a run. Reference fetch failures, missing
// names and failed live lookups are absorbed further down (sentinels and
// advisories), so they never show up here.

use thiserror::Error;

use crate::input::normalizer::{MAX_BATCH_SIZE, MIN_BATCH_SIZE};

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no valid stock codes found (expected at least {MIN_BATCH_SIZE} six-digit code)")]
    NoValidCodes,

    #[error("too many stock codes: {0} given, at most {MAX_BATCH_SIZE} allowed")]
    BatchTooLarge(usize),
}
