// Input handling: turning free text into canonical stock codes.

pub mod normalizer;

pub use normalizer::{normalize, validate_batch, NormalizedInput, StockCode};
