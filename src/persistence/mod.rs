// Candle history caching
pub mod memory;
pub mod redis_store;

use crate::models::Candle;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;

/// Default freshness window for cached history
pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// Cached history for one (symbol, interval) key, replaced wholesale on refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub symbol: String,
    pub interval: String,
    pub candles: Vec<Candle>,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(symbol: &str, interval: &str, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            candles,
            cached_at: Utc::now(),
        }
    }
}

/// Persistence contract behind the history cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read_latest(&self, symbol: &str, interval: &str) -> Result<Option<CacheEntry>>;

    async fn upsert(&self, entry: CacheEntry) -> Result<()>;

    async fn delete(&self, symbol: &str, interval: &str) -> Result<()>;

    async fn delete_all(&self) -> Result<()>;
}

/// Cache-aside wrapper: serve fresh cached history, otherwise fetch and store
///
/// Store failures never reach the caller; they are logged and the call
/// falls through to the fetch function.
#[derive(Clone)]
pub struct HistoryCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl HistoryCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn with_default_ttl(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, Duration::seconds(DEFAULT_TTL_SECS))
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        Utc::now() - entry.cached_at <= self.ttl
    }

    /// Return the latest `limit` cached candles, or call `fetch` on a miss
    ///
    /// Only a non-empty fetch result is written back. Errors from `fetch`
    /// itself are returned unchanged.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        fetch: F,
    ) -> std::result::Result<Vec<Candle>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Vec<Candle>, E>>,
    {
        match self.store.read_latest(symbol, interval).await {
            Ok(Some(entry)) if self.is_fresh(&entry) => {
                let skip = entry.candles.len().saturating_sub(limit);
                tracing::debug!(
                    symbol,
                    interval,
                    cached = entry.candles.len(),
                    "History cache hit"
                );
                return Ok(entry.candles.into_iter().skip(skip).collect());
            }
            Ok(Some(entry)) => {
                tracing::debug!(
                    symbol,
                    interval,
                    cached_at = %entry.cached_at,
                    "History cache stale"
                );
            }
            Ok(None) => {
                tracing::debug!(symbol, interval, "History cache miss");
            }
            Err(e) => {
                tracing::warn!(
                    symbol,
                    interval,
                    "History cache read failed, fetching directly: {}",
                    e
                );
            }
        }

        let candles = fetch().await?;
        self.store_fetched(symbol, interval, &candles).await;

        Ok(candles)
    }

    /// Fetch unconditionally and replace the cached entry
    ///
    /// The existing entry is only superseded by a successful, non-empty
    /// fetch; a failed refresh leaves it serving readers.
    pub async fn refresh<F, Fut, E>(
        &self,
        symbol: &str,
        interval: &str,
        fetch: F,
    ) -> std::result::Result<Vec<Candle>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Vec<Candle>, E>>,
    {
        let candles = fetch().await?;
        self.store_fetched(symbol, interval, &candles).await;

        Ok(candles)
    }

    async fn store_fetched(&self, symbol: &str, interval: &str, candles: &[Candle]) {
        if candles.is_empty() {
            return;
        }

        let entry = CacheEntry::new(symbol, interval, candles.to_vec());
        if let Err(e) = self.store.upsert(entry).await {
            tracing::warn!(symbol, interval, "History cache write failed: {}", e);
        }
    }

    pub async fn clear(&self, symbol: &str, interval: &str) {
        match self.store.delete(symbol, interval).await {
            Ok(()) => tracing::info!(symbol, interval, "Cleared cached history"),
            Err(e) => tracing::warn!(symbol, interval, "Failed to clear cached history: {}", e),
        }
    }

    pub async fn clear_all(&self) {
        match self.store.delete_all().await {
            Ok(()) => tracing::info!("Cleared all cached history"),
            Err(e) => tracing::warn!("Failed to clear cached history: {}", e),
        }
    }
}
