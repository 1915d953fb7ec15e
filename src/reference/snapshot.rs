// ReferenceSnapshot: the frozen view of all classification data for one run.
//
// Built once (from a market data source or a snapshot file), then shared
// read-only across every classification task. Alongside the catalogs it keeps
// two inverted indexes so per-code lookups don't rescan every catalog:
//
//   code -> index of the first industry containing it
//   code -> ascending indexes of every concept containing it
//
// Both indexes reproduce exactly what a linear scan in catalog order would
// find.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::input::StockCode;

/// Which catalog a classification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationKind {
    Industry,
    Concept,
}

impl ClassificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationKind::Industry => "industry",
            ClassificationKind::Concept => "concept",
        }
    }
}

impl std::fmt::Display for ClassificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One industry or concept board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Position in the source catalog (0 = first listed, hottest).
    pub rank: usize,
    /// Signed daily change in percent, when the source reported one.
    #[serde(default)]
    pub change_rate: Option<f64>,
    pub members: BTreeSet<StockCode>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, rank: usize, change_rate: Option<f64>) -> Self {
        Self {
            name: name.into(),
            rank,
            change_rate,
            members: BTreeSet::new(),
        }
    }

    pub fn with_members<I>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = StockCode>,
    {
        self.members.extend(members);
        self
    }

    pub fn contains(&self, code: &str) -> bool {
        self.members.contains(code)
    }
}

/// Immutable, query-ready classification data for one analysis run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "SnapshotData")]
pub struct ReferenceSnapshot {
    code_to_name: HashMap<StockCode, String>,
    industries: Vec<CatalogEntry>,
    concepts: Vec<CatalogEntry>,
    built_at: Option<DateTime<Utc>>,
    industry_index: HashMap<StockCode, usize>,
    concept_index: HashMap<StockCode, Vec<usize>>,
}

impl ReferenceSnapshot {
    /// Freeze the given catalogs into a snapshot.
    ///
    /// Catalog order is preserved. Entries sharing a name are collapsed into
    /// the first one (memberships unioned) and ranks are renumbered to the
    /// final positions, so names stay unique keys.
    pub fn new(
        code_to_name: HashMap<StockCode, String>,
        industries: Vec<CatalogEntry>,
        concepts: Vec<CatalogEntry>,
    ) -> Self {
        let industries = collapse_duplicates(industries, ClassificationKind::Industry);
        let concepts = collapse_duplicates(concepts, ClassificationKind::Concept);

        let mut industry_index: HashMap<StockCode, usize> = HashMap::new();
        for (i, entry) in industries.iter().enumerate() {
            for code in &entry.members {
                industry_index.entry(code.clone()).or_insert(i);
            }
        }

        let mut concept_index: HashMap<StockCode, Vec<usize>> = HashMap::new();
        for (i, entry) in concepts.iter().enumerate() {
            for code in &entry.members {
                concept_index.entry(code.clone()).or_default().push(i);
            }
        }

        Self {
            code_to_name,
            industries,
            concepts,
            built_at: None,
            industry_index,
            concept_index,
        }
    }

    pub fn with_built_at(mut self, built_at: DateTime<Utc>) -> Self {
        self.built_at = Some(built_at);
        self
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.code_to_name.get(code).map(String::as_str)
    }

    pub fn stock_count(&self) -> usize {
        self.code_to_name.len()
    }

    pub fn industries(&self) -> &[CatalogEntry] {
        &self.industries
    }

    pub fn concepts(&self) -> &[CatalogEntry] {
        &self.concepts
    }

    pub fn catalog(&self, kind: ClassificationKind) -> &[CatalogEntry] {
        match kind {
            ClassificationKind::Industry => &self.industries,
            ClassificationKind::Concept => &self.concepts,
        }
    }

    /// The first industry, in catalog order, that lists this code.
    pub fn first_industry_for(&self, code: &str) -> Option<&CatalogEntry> {
        self.industry_index
            .get(code)
            .map(|&i| &self.industries[i])
    }

    /// Every concept listing this code, in catalog order.
    pub fn concepts_for<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.concept_index
            .get(code)
            .into_iter()
            .flatten()
            .map(move |&i| &self.concepts[i])
    }

    /// Read a snapshot previously written with [`ReferenceSnapshot::write_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse snapshot file {}", path.display()))
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot file {}", path.display()))
    }
}

fn collapse_duplicates(entries: Vec<CatalogEntry>, kind: ClassificationKind) -> Vec<CatalogEntry> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<CatalogEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match positions.get(&entry.name) {
            Some(&pos) => {
                warn!(kind = %kind, name = %entry.name, "Duplicate catalog entry, merging members");
                let kept = &mut out[pos];
                kept.members.extend(entry.members);
                if kept.change_rate.is_none() {
                    kept.change_rate = entry.change_rate;
                }
            }
            None => {
                positions.insert(entry.name.clone(), out.len());
                out.push(entry);
            }
        }
    }

    for (i, entry) in out.iter_mut().enumerate() {
        entry.rank = i;
    }
    out
}

// -- Serde representation (indexes are rebuilt on load, never stored) --

#[derive(Serialize)]
struct SnapshotView<'a> {
    built_at: Option<DateTime<Utc>>,
    stocks: &'a HashMap<StockCode, String>,
    industries: &'a [CatalogEntry],
    concepts: &'a [CatalogEntry],
}

#[derive(Deserialize)]
struct SnapshotData {
    #[serde(default)]
    built_at: Option<DateTime<Utc>>,
    #[serde(default)]
    stocks: HashMap<StockCode, String>,
    #[serde(default)]
    industries: Vec<CatalogEntry>,
    #[serde(default)]
    concepts: Vec<CatalogEntry>,
}

impl From<SnapshotData> for ReferenceSnapshot {
    fn from(data: SnapshotData) -> Self {
        let snapshot = ReferenceSnapshot::new(data.stocks, data.industries, data.concepts);
        match data.built_at {
            Some(at) => snapshot.with_built_at(at),
            None => snapshot,
        }
    }
}

impl Serialize for ReferenceSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SnapshotView {
            built_at: self.built_at,
            stocks: &self.code_to_name,
            industries: &self.industries,
            concepts: &self.concepts,
        }
        .serialize(serializer)
    }
}
