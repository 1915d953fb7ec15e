// HTTP client for a JSON market data service.
//
// The service exposes board listings, board members, the stock name table and
// a per-stock info table:
//
//   GET /stocks                         -> [{"code", "name"}]
//   GET /boards/{kind}                  -> [{"name", "change_rate"}]
//   GET /boards/{kind}/{name}/members   -> [{"code", ...}]
//   GET /stocks/{code}/info             -> [{"item", "value"}]
//
// Board names are Chinese text, so every path segment is percent-encoded.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use super::traits::{ClassificationSummary, MarketDataSource};
use crate::input::StockCode;
use crate::reference::ClassificationKind;

/// Thin reqwest wrapper over the market data service.
pub struct HttpMarketSource {
    client: reqwest::Client,
    base_url: Url,
    limiter: RateLimiter,
}

impl HttpMarketSource {
    /// Create a client for the service at `base_url`, throttled to
    /// `requests_per_second`.
    pub fn new(base_url: &str, requests_per_second: f64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sectorscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid market data URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Market data URL cannot be used as a base: {base_url}");
        }

        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::new(requests_per_second),
        })
    }

    /// Build an endpoint URL from raw (unencoded) path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Market data URL cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET an endpoint and deserialize the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        self.limiter.acquire().await;

        debug!(url = %url, "Market data GET request");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Market data request failed: {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Market data service returned {status} for {url}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize response from {url}"))
    }
}

#[async_trait]
impl MarketDataSource for HttpMarketSource {
    async fn lookup_display_names(&self) -> Result<HashMap<StockCode, String>> {
        let rows: Vec<StockRow> = self.get_json(&["stocks"]).await?;
        let total = rows.len();
        let names: HashMap<StockCode, String> = rows
            .into_iter()
            .filter_map(|row| StockCode::parse(&row.code).map(|code| (code, row.name)))
            .collect();
        if names.len() < total {
            warn!(
                skipped = total - names.len(),
                "Ignored malformed codes in stock name table"
            );
        }
        Ok(names)
    }

    async fn list_classifications(
        &self,
        kind: ClassificationKind,
    ) -> Result<Vec<ClassificationSummary>> {
        self.get_json(&["boards", kind.as_str()]).await
    }

    async fn list_members(&self, kind: ClassificationKind, name: &str) -> Result<Vec<String>> {
        let rows: Vec<MemberRow> = self
            .get_json(&["boards", kind.as_str(), name, "members"])
            .await?;
        Ok(rows.into_iter().map(|r| r.code).collect())
    }

    async fn lookup_live_attribute(
        &self,
        code: &StockCode,
        attribute: &str,
    ) -> Result<Option<String>> {
        let rows: Vec<InfoRow> = self.get_json(&["stocks", code.as_str(), "info"]).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.item == attribute)
            .and_then(|r| r.value_text()))
    }
}

// -- Serde types for service responses --

#[derive(Debug, Deserialize)]
struct StockRow {
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    code: String,
}

/// One row of the per-stock info table. Values are mixed text and numbers.
#[derive(Debug, Deserialize)]
pub struct InfoRow {
    pub item: String,
    pub value: serde_json::Value,
}

impl InfoRow {
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
