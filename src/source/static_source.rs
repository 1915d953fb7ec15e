// Static market data source: classification data from a JSON document.
//
// Used for offline runs (a dump exported from any upstream service) and as
// the fixture source in tests. Document layout:
//
//   {
//     "stocks":     { "600519": "Kweichow Moutai", ... },
//     "industries": [ { "name": "Liquor", "change_rate": "1.2%", "members": ["600519"] } ],
//     "concepts":   [ ... same shape ... ],
//     "attributes": { "600519": { "industry": "Liquor" } }
//   }

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::traits::{deserialize_change_rate, ClassificationSummary, MarketDataSource};
use crate::input::StockCode;
use crate::reference::ClassificationKind;

/// The on-disk document read by [`StaticMarketSource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub stocks: HashMap<String, String>,
    #[serde(default)]
    pub industries: Vec<BoardDocument>,
    #[serde(default)]
    pub concepts: Vec<BoardDocument>,
    #[serde(default)]
    pub attributes: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardDocument {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_change_rate")]
    pub change_rate: Option<f64>,
    #[serde(default)]
    pub members: Vec<String>,
}

impl BoardDocument {
    pub fn new(name: &str, members: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            change_rate: None,
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_change_rate(mut self, change_rate: f64) -> Self {
        self.change_rate = Some(change_rate);
        self
    }
}

/// In-memory source serving a [`SourceDocument`].
pub struct StaticMarketSource {
    document: SourceDocument,
}

impl StaticMarketSource {
    pub fn new(document: SourceDocument) -> Self {
        Self { document }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file {}", path.display()))?;
        let document: SourceDocument = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse source file {}", path.display()))?;
        Ok(Self::new(document))
    }

    fn boards(&self, kind: ClassificationKind) -> &[BoardDocument] {
        match kind {
            ClassificationKind::Industry => &self.document.industries,
            ClassificationKind::Concept => &self.document.concepts,
        }
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketSource {
    async fn lookup_display_names(&self) -> Result<HashMap<StockCode, String>> {
        let mut names = HashMap::with_capacity(self.document.stocks.len());
        let mut skipped = 0usize;
        for (raw, name) in &self.document.stocks {
            match StockCode::parse(raw) {
                Some(code) => {
                    names.insert(code, name.clone());
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Ignored malformed codes in stock name table");
        }
        Ok(names)
    }

    async fn list_classifications(
        &self,
        kind: ClassificationKind,
    ) -> Result<Vec<ClassificationSummary>> {
        Ok(self
            .boards(kind)
            .iter()
            .map(|b| ClassificationSummary {
                name: b.name.clone(),
                change_rate: b.change_rate,
            })
            .collect())
    }

    async fn list_members(&self, kind: ClassificationKind, name: &str) -> Result<Vec<String>> {
        self.boards(kind)
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.members.clone())
            .ok_or_else(|| anyhow::anyhow!("Unknown {kind} board: {name}"))
    }

    async fn lookup_live_attribute(
        &self,
        code: &StockCode,
        attribute: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .document
            .attributes
            .get(code.as_str())
            .and_then(|attrs| attrs.get(attribute))
            .cloned())
    }
}
