// Market data sources: where catalogs, memberships and names come from.

pub mod cache;
pub mod http;
pub mod rate_limiter;
pub mod static_source;
pub mod traits;

pub use cache::CachedSource;
pub use http::HttpMarketSource;
pub use static_source::{SourceDocument, StaticMarketSource};
pub use traits::{ClassificationSummary, MarketDataSource};
