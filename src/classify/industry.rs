// Industry resolver: exactly one industry label per code.
//
// Resolution order, first hit wins:
// 1. The first industry board (in catalog order) listing the code
// 2. A live point lookup of the stock's "industry" attribute, for codes the
//    bulk catalog missed (new listings, boards that failed to load)
// 3. The "unknown industry" sentinel
//
// Industry boards are supposed to partition the market, so step 1 only has to
// break ties when upstream data is inconsistent.

use std::time::Duration;

use tracing::debug;

use super::record::UNKNOWN_INDUSTRY;
use crate::input::StockCode;
use crate::reference::ReferenceSnapshot;
use crate::source::MarketDataSource;

/// Attribute name requested from the live lookup.
pub const LIVE_INDUSTRY_ATTRIBUTE: &str = "industry";

/// Catalog-only resolution (step 1).
pub fn resolve_from_catalog<'a>(code: &str, snapshot: &'a ReferenceSnapshot) -> Option<&'a str> {
    snapshot
        .first_industry_for(code)
        .map(|entry| entry.name.as_str())
}

/// Resolve a code's industry. Never fails and never returns an empty string.
///
/// `live` is optional: offline runs (snapshot files) skip step 2. Live
/// lookups are bounded by `timeout`; errors and timeouts fall through to
/// the sentinel.
pub async fn resolve(
    code: &StockCode,
    snapshot: &ReferenceSnapshot,
    live: Option<&dyn MarketDataSource>,
    timeout: Duration,
) -> String {
    if let Some(name) = resolve_from_catalog(code.as_str(), snapshot) {
        return name.to_string();
    }

    if let Some(source) = live {
        let lookup = source.lookup_live_attribute(code, LIVE_INDUSTRY_ATTRIBUTE);
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(Some(industry))) if !industry.trim().is_empty() => {
                return industry.trim().to_string();
            }
            Ok(Ok(_)) => {
                debug!(code = %code, "Live lookup returned no industry");
            }
            Ok(Err(e)) => {
                debug!(code = %code, error = %e, "Live industry lookup failed");
            }
            Err(_) => {
                debug!(code = %code, timeout_ms = timeout.as_millis() as u64, "Live industry lookup timed out");
            }
        }
    }

    UNKNOWN_INDUSTRY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::reference::{CatalogEntry, ClassificationKind};
    use crate::source::static_source::{SourceDocument, StaticMarketSource};
    use crate::source::ClassificationSummary;

    fn code(s: &str) -> StockCode {
        StockCode::parse(s).unwrap()
    }

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::new(
            HashMap::new(),
            vec![
                CatalogEntry::new("Liquor", 0, None).with_members([code("600519")]),
                CatalogEntry::new("Beverages", 1, None).with_members([code("600519"), code("000858")]),
            ],
            vec![],
        )
    }

    fn live_source() -> StaticMarketSource {
        let mut doc = SourceDocument::default();
        doc.attributes.insert(
            "300750".to_string(),
            HashMap::from([("industry".to_string(), " Batteries ".to_string())]),
        );
        doc.attributes.insert(
            "688001".to_string(),
            HashMap::from([("industry".to_string(), "   ".to_string())]),
        );
        StaticMarketSource::new(doc)
    }

    #[tokio::test]
    async fn test_catalog_first_match_wins() {
        let snap = snapshot();
        let got = resolve(&code("600519"), &snap, None, Duration::from_secs(1)).await;
        assert_eq!(got, "Liquor");
        let got = resolve(&code("000858"), &snap, None, Duration::from_secs(1)).await;
        assert_eq!(got, "Beverages");
    }

    #[tokio::test]
    async fn test_live_fallback() {
        let snap = snapshot();
        let source = live_source();
        let got = resolve(&code("300750"), &snap, Some(&source), Duration::from_secs(1)).await;
        assert_eq!(got, "Batteries");
    }

    #[tokio::test]
    async fn test_blank_live_value_is_unknown() {
        let snap = snapshot();
        let source = live_source();
        let got = resolve(&code("688001"), &snap, Some(&source), Duration::from_secs(1)).await;
        assert_eq!(got, UNKNOWN_INDUSTRY);
    }

    #[tokio::test]
    async fn test_offline_unknown() {
        let snap = snapshot();
        let got = resolve(&code("300750"), &snap, None, Duration::from_secs(1)).await;
        assert_eq!(got, UNKNOWN_INDUSTRY);
    }

    struct SlowSource;

    #[async_trait]
    impl MarketDataSource for SlowSource {
        async fn lookup_display_names(&self) -> anyhow::Result<HashMap<StockCode, String>> {
            Ok(HashMap::new())
        }
        async fn list_classifications(
            &self,
            _kind: ClassificationKind,
        ) -> anyhow::Result<Vec<ClassificationSummary>> {
            Ok(Vec::new())
        }
        async fn list_members(
            &self,
            _kind: ClassificationKind,
            _name: &str,
        ) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn lookup_live_attribute(
            &self,
            _code: &StockCode,
            _attribute: &str,
        ) -> anyhow::Result<Option<String>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some("Too late".to_string()))
        }
    }

    #[tokio::test]
    async fn test_live_timeout_degrades_to_sentinel() {
        let snap = snapshot();
        let got = resolve(
            &code("300750"),
            &snap,
            Some(&SlowSource),
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(got, UNKNOWN_INDUSTRY);
    }
}
