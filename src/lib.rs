// sectorscope: industry and concept classification for batches of stock codes
//
// This is the library root. Each module corresponds to one stage of the
// analysis: input normalization, reference data, classification,
// distribution aggregation and presentation.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod distribution;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;
pub mod reference;
pub mod source;
