use super::{CacheEntry, CacheStore};
use crate::error::TradingError;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Key = (String, String);

/// Thread-safe in-process cache store
///
/// Used when no Redis URL is configured, and in tests.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    data: Arc<RwLock<HashMap<Key, CacheEntry>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(symbol: &str, interval: &str) -> Key {
        (symbol.to_string(), interval.to_string())
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> TradingError {
    TradingError::Cache(e.to_string())
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn read_latest(&self, symbol: &str, interval: &str) -> Result<Option<CacheEntry>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(&Self::key(symbol, interval)).cloned())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.insert(Self::key(&entry.symbol, &entry.interval), entry);
        Ok(())
    }

    async fn delete(&self, symbol: &str, interval: &str) -> Result<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.remove(&Self::key(symbol, interval));
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        self.data.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::Utc;

    fn entry(symbol: &str, interval: &str, closes: &[f64]) -> CacheEntry {
        let candles = closes
            .iter()
            .map(|&c| Candle::new(Utc::now(), c, c, c, c, 1.0))
            .collect();
        CacheEntry::new(symbol, interval, candles)
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_entry() {
        let store = InMemoryCacheStore::new();
        store.upsert(entry("BTCUSDT", "1h", &[1.0, 2.0, 3.0])).await.unwrap();
        store.upsert(entry("BTCUSDT", "1h", &[9.0])).await.unwrap();

        let loaded = store.read_latest("BTCUSDT", "1h").await.unwrap().unwrap();
        assert_eq!(loaded.candles.len(), 1);
        assert_eq!(loaded.candles[0].close, 9.0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_per_interval() {
        let store = InMemoryCacheStore::new();
        store.upsert(entry("BTCUSDT", "1h", &[1.0])).await.unwrap();
        store.upsert(entry("BTCUSDT", "4h", &[2.0])).await.unwrap();

        store.delete("BTCUSDT", "1h").await.unwrap();
        assert!(store.read_latest("BTCUSDT", "1h").await.unwrap().is_none());
        assert!(store.read_latest("BTCUSDT", "4h").await.unwrap().is_some());

        store.delete_all().await.unwrap();
        assert!(store.is_empty());
    }
}
