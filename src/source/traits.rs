// Market data source trait: the seam between the classifier and the outside world.
//
// Everything the core knows about boards, their members and stock names comes
// through this trait. The HTTP client and the static JSON source implement it,
// and CachedSource wraps either one with a read-through TTL cache.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::input::StockCode;
use crate::reference::ClassificationKind;

/// One row of a classification listing, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub name: String,
    /// Signed daily change in percent. Sources report this as a number, a
    /// string like "-1.25%", or a placeholder such as "-"; anything that
    /// doesn't parse is treated as unknown.
    #[serde(default, deserialize_with = "deserialize_change_rate")]
    pub change_rate: Option<f64>,
}

/// Read-only access to classification data.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Every listed stock with its display name.
    async fn lookup_display_names(&self) -> Result<HashMap<StockCode, String>>;

    /// All boards of one kind, hottest first.
    async fn list_classifications(
        &self,
        kind: ClassificationKind,
    ) -> Result<Vec<ClassificationSummary>>;

    /// Raw member codes of one board. Callers normalize them.
    async fn list_members(&self, kind: ClassificationKind, name: &str) -> Result<Vec<String>>;

    /// Point lookup of a single attribute (e.g. "industry") for one stock.
    async fn lookup_live_attribute(
        &self,
        code: &StockCode,
        attribute: &str,
    ) -> Result<Option<String>>;
}

/// Parse a change rate from a loosely typed JSON value.
pub fn parse_change_rate(value: &serde_json::Value) -> Option<f64> {
    let rate = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    rate.filter(|r| r.is_finite())
}

pub fn deserialize_change_rate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_change_rate))
}
