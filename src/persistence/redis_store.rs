use super::{CacheEntry, CacheStore};
use crate::error::TradingError;
use crate::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::{timeout, Duration};

const KEY_PREFIX: &str = "candles";

/// Redis-backed cache store
///
/// One string key per (symbol, interval): `candles:{symbol}:{interval}`,
/// holding the JSON-serialized entry. Each upsert overwrites the key.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;

        // Add 5 second timeout to connection attempt
        let conn = timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| {
                TradingError::Cache("Redis connection timeout after 5 seconds".to_string())
            })??;

        tracing::info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }

    fn key(symbol: &str, interval: &str) -> String {
        format!("{}:{}:{}", KEY_PREFIX, symbol, interval)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn read_latest(&self, symbol: &str, interval: &str) -> Result<Option<CacheEntry>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(symbol, interval)).await?;

        raw.map(|json| serde_json::from_str(&json).map_err(TradingError::from))
            .transpose()
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = Self::key(&entry.symbol, &entry.interval);
        let value = serde_json::to_string(&entry)?;

        conn.set::<_, _, ()>(&key, value).await?;

        tracing::debug!("Cached {} candles under {}", entry.candles.len(), key);
        Ok(())
    }

    async fn delete(&self, symbol: &str, interval: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(symbol, interval)).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(format!("{}:*", KEY_PREFIX)).await?;

        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await?;
            tracing::debug!("Removed {} cached history keys", keys.len());
        }

        Ok(())
    }
}
