use crate::api::{BinanceClient, ExchangeClient, FixedWindowRateLimiter, RateLimitStatus};
use crate::config::{credentials_from_env, AppConfig};
use crate::error::TradingError;
use crate::execution::OrderExecutor;
use crate::indicators::{
    calculate_all_indicators, closes, determine_trend, IndicatorConfig, Trend,
};
use crate::models::{Decision, TradeOrder, TradingDecision};
use crate::persistence::{CacheStore, HistoryCache, InMemoryCacheStore, RedisCacheStore};
use crate::strategy::{arbitrate, Strategy};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// Result of one pass through the pipeline
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// What the strategy said on its own, if it had enough data
    pub strategy_signal: Option<TradingDecision>,
    /// Decision after arbitration against the external advisory
    pub decision: TradingDecision,
    pub trend: Option<Trend>,
    /// `None` when the merged decision was HOLD
    pub order: Option<TradeOrder>,
}

/// History → indicators → strategy → arbitration → execution for one pair
pub struct TradingPipeline {
    exchange: Arc<dyn ExchangeClient>,
    cache: HistoryCache,
    strategy: Box<dyn Strategy>,
    executor: OrderExecutor,
    indicators: IndicatorConfig,
    symbol: String,
    interval: String,
    history_limit: usize,
}

impl TradingPipeline {
    pub fn new(
        config: &AppConfig,
        exchange: Arc<dyn ExchangeClient>,
        cache: HistoryCache,
    ) -> Self {
        let executor = OrderExecutor::new(
            exchange.clone(),
            config.exchange.symbol.clone(),
            config.execution.clone(),
        );

        Self {
            exchange,
            cache,
            strategy: config.strategy.kind.build(),
            executor,
            indicators: config.strategy.indicators.clone(),
            symbol: config.exchange.symbol.clone(),
            interval: config.exchange.interval.clone(),
            history_limit: config.exchange.history_limit,
        }
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn executor(&self) -> &OrderExecutor {
        &self.executor
    }

    /// Recent history through the cache; the exchange is only hit on a miss
    pub async fn load_history(&self) -> Result<Vec<crate::models::Candle>> {
        let candles = self
            .cache
            .get_or_fetch(&self.symbol, &self.interval, self.history_limit, || {
                self.exchange
                    .klines(&self.symbol, &self.interval, self.history_limit)
            })
            .await?;
        Ok(candles)
    }

    /// Fetch fresh history and replace the cached entry
    ///
    /// On a failed or empty fetch the previous entry keeps serving
    /// `load_history` until its TTL runs out.
    pub async fn refresh_history(&self) -> Result<usize> {
        let candles = self
            .cache
            .refresh(&self.symbol, &self.interval, || {
                self.exchange
                    .klines(&self.symbol, &self.interval, self.history_limit)
            })
            .await?;
        tracing::info!(
            symbol = %self.symbol,
            interval = %self.interval,
            candles = candles.len(),
            "🔄 History refreshed"
        );
        Ok(candles.len())
    }

    /// Run one decision cycle against `external`
    ///
    /// Live execution failures come back as `Err(Execution)`; everything
    /// else that produced an order record is `Ok`.
    pub async fn run_cycle(&self, external: TradingDecision) -> Result<CycleOutcome> {
        let mut candles = self.load_history().await?;
        calculate_all_indicators(&mut candles, &self.indicators);

        let required = self.strategy.min_candles_required();
        if candles.len() < required {
            tracing::info!(
                strategy = self.strategy.name(),
                "Collecting data... ({}/{} candles)",
                candles.len(),
                required
            );
        }

        let strategy_signal = self.strategy.generate_signal(&candles);
        let trend = determine_trend(&closes(&candles));

        if let (Some(latest), Some(signal)) = (candles.last(), strategy_signal.as_ref()) {
            tracing::info!(
                symbol = %self.symbol,
                close = latest.close,
                rsi = ?latest.rsi,
                trend = ?trend,
                strategy = signal.source(),
                signal = %signal.decision(),
                confidence = signal.confidence(),
                "{}",
                signal.reason()
            );
        }

        let decision = arbitrate(strategy_signal.clone(), external);

        let order = if decision.decision() == Decision::Hold {
            tracing::info!(symbol = %self.symbol, "Holding, no order this cycle");
            None
        } else {
            let execution = self.executor.config();
            Some(
                self.executor
                    .execute(&decision, execution.order_quantity, execution.leverage)
                    .await?,
            )
        };

        Ok(CycleOutcome {
            strategy_signal,
            decision,
            trend,
            order,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub rate_limit: RateLimitStatus,
    pub exchange_ready: bool,
}

/// Explicitly constructed services shared by the worker loops
pub struct AppContext {
    pub config: AppConfig,
    pub rate_limiter: Arc<FixedWindowRateLimiter>,
    pub exchange: Arc<dyn ExchangeClient>,
    pub cache: HistoryCache,
    pub pipeline: Arc<TradingPipeline>,
}

impl AppContext {
    /// Wire up the Binance client and the configured cache backend
    ///
    /// Live mode requires `BINANCE_API_KEY` / `BINANCE_SECRET_KEY`. An
    /// unreachable Redis falls back to the in-memory store.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let rate_limiter = Arc::new(config.rate_limit.build()?);

        let credentials = credentials_from_env();
        if config.is_live() && credentials.is_none() {
            return Err(TradingError::Validation(
                "live mode requires BINANCE_API_KEY and BINANCE_SECRET_KEY".to_string(),
            ));
        }

        let exchange: Arc<dyn ExchangeClient> = Arc::new(BinanceClient::new(
            config.exchange.base_url.clone(),
            credentials,
            rate_limiter.clone(),
            config.exchange.request_timeout(),
        )?);

        let store: Arc<dyn CacheStore> = match config.cache.redis_url.as_deref() {
            Some(url) => match RedisCacheStore::new(url).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!("Redis unavailable ({}), using in-memory history cache", e);
                    Arc::new(InMemoryCacheStore::new())
                }
            },
            None => {
                tracing::info!("No redis_url configured, using in-memory history cache");
                Arc::new(InMemoryCacheStore::new())
            }
        };

        Ok(Self::with_services(config, rate_limiter, exchange, store))
    }

    /// Build from already constructed services
    pub fn with_services(
        config: AppConfig,
        rate_limiter: Arc<FixedWindowRateLimiter>,
        exchange: Arc<dyn ExchangeClient>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let cache = HistoryCache::new(store, chrono::Duration::seconds(config.cache.ttl_secs));
        let pipeline = Arc::new(TradingPipeline::new(&config, exchange.clone(), cache.clone()));

        Self {
            config,
            rate_limiter,
            exchange,
            cache,
            pipeline,
        }
    }

    pub async fn health_check(&self) -> HealthReport {
        let exchange_ready = self.pipeline.executor().can_place_order().await;
        let rate_limit = self.rate_limiter.status();

        HealthReport {
            rate_limit,
            exchange_ready,
        }
    }
}
