// Read-through TTL cache for market data.
//
// Board memberships change at most daily, while a session may run many
// analyses back to back. CachedSource keeps every successful listing for a
// fixed time-to-live so repeated snapshot builds cost nothing. Failed loads
// are not cached; the next build retries them.

use std::collections::HashMap;
use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use super::traits::{ClassificationSummary, MarketDataSource};
use crate::input::StockCode;
use crate::reference::ClassificationKind;

/// Default time-to-live for cached listings (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// String-keyed cache whose entries expire after a per-call TTL.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `loader` and cache its result.
    ///
    /// The lock is not held while loading, so concurrent misses on the same
    /// key may both load; the later insert wins.
    pub async fn get_or_load<F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        {
            let entries = self.entries.lock().await;
            if let Some((loaded_at, value)) = entries.get(key) {
                if loaded_at.elapsed() < ttl {
                    debug!(key, "Cache hit");
                    return Ok(value.clone());
                }
            }
        }

        let value = loader().await?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (Instant::now(), value.clone()));
        Ok(value)
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`MarketDataSource`] decorator caching names, listings and memberships.
///
/// Live attribute lookups pass straight through.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    names: TtlCache<HashMap<StockCode, String>>,
    listings: TtlCache<Vec<ClassificationSummary>>,
    members: TtlCache<Vec<String>>,
}

impl<S: MarketDataSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            names: TtlCache::new(),
            listings: TtlCache::new(),
            members: TtlCache::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    async fn lookup_display_names(&self) -> Result<HashMap<StockCode, String>> {
        self.names
            .get_or_load("names", self.ttl, || self.inner.lookup_display_names())
            .await
    }

    async fn list_classifications(
        &self,
        kind: ClassificationKind,
    ) -> Result<Vec<ClassificationSummary>> {
        self.listings
            .get_or_load(kind.as_str(), self.ttl, || {
                self.inner.list_classifications(kind)
            })
            .await
    }

    async fn list_members(&self, kind: ClassificationKind, name: &str) -> Result<Vec<String>> {
        let key = format!("{kind}/{name}");
        self.members
            .get_or_load(&key, self.ttl, || self.inner.list_members(kind, name))
            .await
    }

    async fn lookup_live_attribute(
        &self,
        code: &StockCode,
        attribute: &str,
    ) -> Result<Option<String>> {
        self.inner.lookup_live_attribute(code, attribute).await
    }
}
