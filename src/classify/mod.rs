// Classification: industry resolution, concept scoring and batch orchestration.

pub mod batch;
pub mod concepts;
pub mod industry;
pub mod record;

pub use batch::{classify, ClassifiedBatch, ClassifyOptions};
pub use concepts::{ConceptWeights, ScoredMatch};
pub use record::{StockRecord, NO_RELATED_CONCEPTS, UNKNOWN_INDUSTRY, UNKNOWN_STOCK};
