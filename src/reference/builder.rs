// Snapshot builder: pulls every catalog and membership from a source.
//
// The builder never fails. A listing or membership that can't be fetched is
// replaced by an empty one and recorded as an Advisory, because a partial
// snapshot still classifies most codes correctly while an aborted run
// classifies none. Callers surface the advisories next to the results.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use super::snapshot::{CatalogEntry, ClassificationKind, ReferenceSnapshot};
use crate::input::StockCode;
use crate::progress::ProgressReporter;
use crate::source::{ClassificationSummary, MarketDataSource};

/// A non-fatal reference data problem that may reduce accuracy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advisory {
    /// The stock name table could not be loaded.
    NamesUnavailable { error: String },
    /// A whole catalog could not be listed.
    CatalogUnavailable {
        kind: ClassificationKind,
        error: String,
    },
    /// One board's members could not be fetched.
    MembersUnavailable {
        kind: ClassificationKind,
        name: String,
        error: String,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::NamesUnavailable { error } => {
                write!(f, "stock names unavailable: {error}")
            }
            Advisory::CatalogUnavailable { kind, error } => {
                write!(f, "{kind} catalog unavailable: {error}")
            }
            Advisory::MembersUnavailable { kind, name, error } => {
                write!(f, "members of {kind} '{name}' unavailable: {error}")
            }
        }
    }
}

/// A snapshot plus whatever went wrong while assembling it.
#[derive(Debug, Clone, Default)]
pub struct LoadedReference {
    pub snapshot: ReferenceSnapshot,
    pub advisories: Vec<Advisory>,
}

impl LoadedReference {
    /// Wrap a snapshot that was loaded whole (e.g. from a file).
    pub fn from_snapshot(snapshot: ReferenceSnapshot) -> Self {
        Self {
            snapshot,
            advisories: Vec::new(),
        }
    }
}

/// Builds a [`ReferenceSnapshot`] from a [`MarketDataSource`].
pub struct SnapshotBuilder<'a> {
    source: &'a dyn MarketDataSource,
    concurrency: usize,
    progress: &'a dyn ProgressReporter,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(
        source: &'a dyn MarketDataSource,
        concurrency: usize,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            progress,
        }
    }

    pub async fn build(&self) -> LoadedReference {
        let mut advisories = Vec::new();

        let names = match self.source.lookup_display_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to load stock names");
                advisories.push(Advisory::NamesUnavailable {
                    error: e.to_string(),
                });
                HashMap::new()
            }
        };

        let industries = self
            .build_catalog(ClassificationKind::Industry, &mut advisories)
            .await;
        let concepts = self
            .build_catalog(ClassificationKind::Concept, &mut advisories)
            .await;

        let snapshot = ReferenceSnapshot::new(names, industries, concepts).with_built_at(Utc::now());

        info!(
            stocks = snapshot.stock_count(),
            industries = snapshot.industries().len(),
            concepts = snapshot.concepts().len(),
            advisories = advisories.len(),
            "Reference snapshot built"
        );

        LoadedReference {
            snapshot,
            advisories,
        }
    }

    async fn build_catalog(
        &self,
        kind: ClassificationKind,
        advisories: &mut Vec<Advisory>,
    ) -> Vec<CatalogEntry> {
        let summaries = match self.source.list_classifications(kind).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to list catalog");
                advisories.push(Advisory::CatalogUnavailable {
                    kind,
                    error: e.to_string(),
                });
                return Vec::new();
            }
        };

        let total = summaries.len();
        self.progress.start(&format!("Loading {kind} boards"), total);

        // `buffered` yields in submission order, so the catalog keeps the
        // source ranking no matter which fetch finishes first.
        let mut fetches = stream::iter(summaries.into_iter().enumerate().map(
            |(rank, summary)| async move {
                let members = self.source.list_members(kind, &summary.name).await;
                (rank, summary, members)
            },
        ))
        .buffered(self.concurrency);

        let mut entries = Vec::with_capacity(total);
        let mut done = 0;
        while let Some((rank, summary, members)) = fetches.next().await {
            entries.push(self.make_entry(kind, rank, summary, members, advisories));
            done += 1;
            self.progress.advance(done);
        }
        self.progress.finish();

        info!(kind = %kind, boards = entries.len(), "Catalog loaded");
        entries
    }

    fn make_entry(
        &self,
        kind: ClassificationKind,
        rank: usize,
        summary: ClassificationSummary,
        members: anyhow::Result<Vec<String>>,
        advisories: &mut Vec<Advisory>,
    ) -> CatalogEntry {
        let entry = CatalogEntry::new(summary.name, rank, summary.change_rate);
        match members {
            Ok(raw) => {
                let total = raw.len();
                let entry = entry.with_members(raw.iter().filter_map(|c| StockCode::parse(c)));
                if entry.members.len() < total {
                    warn!(
                        kind = %kind,
                        name = %entry.name,
                        listed = total,
                        kept = entry.members.len(),
                        "Dropped malformed or repeated member codes"
                    );
                }
                entry
            }
            Err(e) => {
                warn!(kind = %kind, name = %entry.name, error = %e, "Failed to fetch members");
                advisories.push(Advisory::MembersUnavailable {
                    kind,
                    name: entry.name.clone(),
                    error: e.to_string(),
                });
                entry
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use crate::source::static_source::{BoardDocument, SourceDocument, StaticMarketSource};
    use async_trait::async_trait;

    fn document() -> SourceDocument {
        SourceDocument {
            stocks: HashMap::from([("600519".to_string(), "Kweichow Moutai".to_string())]),
            industries: vec![BoardDocument::new("Liquor", &["600519", "000858"])],
            concepts: vec![
                BoardDocument::new("Consumption", &["600519", "bad", "sh000858"]).with_change_rate(1.5),
                BoardDocument::new("Dividend", &["600519"]),
            ],
            attributes: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_build_keeps_catalog_order_and_normalizes_members() {
        let source = StaticMarketSource::new(document());
        let loaded = SnapshotBuilder::new(&source, 4, &NoopProgress).build().await;

        assert!(loaded.advisories.is_empty());
        let snap = &loaded.snapshot;
        assert!(snap.built_at().is_some());
        assert_eq!(snap.concepts()[0].name, "Consumption");
        assert_eq!(snap.concepts()[0].rank, 0);
        assert_eq!(snap.concepts()[0].change_rate, Some(1.5));
        assert_eq!(snap.concepts()[0].members.len(), 2);
        assert!(snap.concepts()[0].contains("000858"));
        assert_eq!(snap.concepts()[1].rank, 1);
    }

    /// Serves the static document but fails for one named board.
    struct FlakySource {
        inner: StaticMarketSource,
        broken_board: &'static str,
    }

    #[async_trait]
    impl MarketDataSource for FlakySource {
        async fn lookup_display_names(&self) -> anyhow::Result<HashMap<StockCode, String>> {
            anyhow::bail!("name service timed out")
        }

        async fn list_classifications(
            &self,
            kind: ClassificationKind,
        ) -> anyhow::Result<Vec<ClassificationSummary>> {
            if kind == ClassificationKind::Industry {
                anyhow::bail!("industry listing returned 503");
            }
            self.inner.list_classifications(kind).await
        }

        async fn list_members(
            &self,
            kind: ClassificationKind,
            name: &str,
        ) -> anyhow::Result<Vec<String>> {
            if name == self.broken_board {
                anyhow::bail!("connection reset");
            }
            self.inner.list_members(kind, name).await
        }

        async fn lookup_live_attribute(
            &self,
            _code: &StockCode,
            _attribute: &str,
        ) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_failures_become_advisories() {
        let source = FlakySource {
            inner: StaticMarketSource::new(document()),
            broken_board: "Consumption",
        };
        let loaded = SnapshotBuilder::new(&source, 2, &NoopProgress).build().await;

        assert_eq!(loaded.advisories.len(), 3);
        assert!(matches!(
            loaded.advisories[0],
            Advisory::NamesUnavailable { .. }
        ));
        assert!(matches!(
            loaded.advisories[1],
            Advisory::CatalogUnavailable {
                kind: ClassificationKind::Industry,
                ..
            }
        ));
        assert!(matches!(
            &loaded.advisories[2],
            Advisory::MembersUnavailable { name, .. } if name == "Consumption"
        ));

        // The failed board stays in the catalog with no members.
        let snap = &loaded.snapshot;
        assert_eq!(snap.concepts().len(), 2);
        assert!(snap.concepts()[0].members.is_empty());
        assert_eq!(snap.concepts_for("600519").count(), 1);
        assert!(snap.industries().is_empty());
    }
}
