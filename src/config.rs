use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::classify::batch::{DEFAULT_CONCURRENCY, DEFAULT_LIVE_TIMEOUT};
use crate::source::cache::DEFAULT_TTL;

/// Default request budget for the HTTP market data source.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Command
/// line flags override these values where both exist.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HTTP market data service (SECTORSCOPE_SOURCE_URL)
    pub source_url: Option<String>,
    /// Default reference snapshot file (SECTORSCOPE_SNAPSHOT)
    pub snapshot_path: Option<PathBuf>,
    /// Parallel fetches and classifications
    pub concurrency: usize,
    /// Bound on a single live industry lookup
    pub live_timeout: Duration,
    /// How long fetched reference listings stay fresh
    pub cache_ttl: Duration,
    pub requests_per_second: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the source URL and snapshot path.
    /// Malformed numbers are an error rather than silently ignored.
    pub fn load() -> Result<Self> {
        Ok(Self {
            source_url: non_empty_var("SECTORSCOPE_SOURCE_URL"),
            snapshot_path: non_empty_var("SECTORSCOPE_SNAPSHOT").map(PathBuf::from),
            concurrency: parse_var("SECTORSCOPE_CONCURRENCY")?
                .unwrap_or(DEFAULT_CONCURRENCY)
                .max(1),
            live_timeout: parse_var("SECTORSCOPE_LIVE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LIVE_TIMEOUT),
            cache_ttl: parse_var("SECTORSCOPE_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TTL),
            requests_per_second: parse_var("SECTORSCOPE_REQUESTS_PER_SECOND")?
                .unwrap_or(DEFAULT_REQUESTS_PER_SECOND),
        })
    }

    /// Check that a market data service is configured.
    /// Call this before any operation that must fetch reference data and has
    /// no source file to fall back on.
    pub fn require_source(&self) -> Result<&str> {
        match self.source_url.as_deref() {
            Some(url) => Ok(url),
            None => anyhow::bail!(
                "SECTORSCOPE_SOURCE_URL not set. Add it to your .env file,\n\
                 or pass --source-file to read reference data from a JSON document."
            ),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    non_empty_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("{name} must be a number, got {raw:?}"))
        })
        .transpose()
}
