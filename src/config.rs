use crate::api::binance::DEFAULT_BASE_URL;
use crate::api::{Credentials, FixedWindowRateLimiter};
use crate::error::TradingError;
use crate::execution::{ExecutionConfig, ExecutionMode, HARD_MAX_LEVERAGE};
use crate::indicators::IndicatorConfig;
use crate::persistence::DEFAULT_TTL_SECS;
use crate::strategy::StrategyKind;
use crate::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

/// Optional config file looked up when no `--config` path is given
pub const DEFAULT_CONFIG_FILE: &str = "config/autotrader";
pub const ENV_PREFIX: &str = "AUTOTRADER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub symbol: String,
    pub interval: String,
    /// Candles requested per history refresh
    pub history_limit: usize,
    pub request_timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: "1h".to_string(),
            history_limit: 200,
            request_timeout_secs: 10,
        }
    }
}

impl ExchangeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Well under Binance's 1200 weight/minute
        Self {
            capacity: 10,
            window_ms: 1_000,
        }
    }
}

impl RateLimitConfig {
    pub fn build(&self) -> Result<FixedWindowRateLimiter> {
        let capacity = NonZeroU32::new(self.capacity).ok_or_else(|| {
            TradingError::Validation("rate_limit.capacity must be at least 1".to_string())
        })?;
        if self.window_ms == 0 {
            return Err(TradingError::Validation(
                "rate_limit.window_ms must be positive".to_string(),
            ));
        }
        Ok(FixedWindowRateLimiter::new(
            capacity,
            Duration::from_millis(self.window_ms),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// In-memory cache when unset
    pub redis_url: Option<String>,
    pub ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub indicators: IndicatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub refresh_interval_secs: u64,
    pub health_interval_secs: u64,
    pub trading_interval_secs: u64,
    /// How long in-flight work may run after shutdown is requested
    pub shutdown_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            health_interval_secs: 60,
            trading_interval_secs: 300,
            shutdown_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
    pub execution: ExecutionConfig,
    pub strategy: StrategyConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Layer defaults, then the config file, then `AUTOTRADER__*` env vars
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rate_limit.build()?;

        if self.exchange.history_limit == 0 {
            return Err(TradingError::Validation(
                "exchange.history_limit must be positive".to_string(),
            ));
        }
        if self.execution.max_leverage == 0 || self.execution.max_leverage > HARD_MAX_LEVERAGE {
            return Err(TradingError::Validation(format!(
                "execution.max_leverage must be in [1, {}]",
                HARD_MAX_LEVERAGE
            )));
        }
        if self.cache.ttl_secs <= 0 {
            return Err(TradingError::Validation(
                "cache.ttl_secs must be positive".to_string(),
            ));
        }

        // The trading loop submits these on every cycle
        self.execution
            .check_order(self.execution.order_quantity, self.execution.leverage)?;

        for (name, secs) in [
            ("refresh_interval_secs", self.scheduler.refresh_interval_secs),
            ("health_interval_secs", self.scheduler.health_interval_secs),
            ("trading_interval_secs", self.scheduler.trading_interval_secs),
        ] {
            if secs == 0 {
                return Err(TradingError::Validation(format!(
                    "scheduler.{} must be positive",
                    name
                )));
            }
        }

        let warmup = self.strategy.indicators.warmup_bars();
        if self.exchange.history_limit < warmup {
            tracing::warn!(
                history_limit = self.exchange.history_limit,
                warmup,
                "History limit is shorter than indicator warmup; signals may be missing"
            );
        }

        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.execution.mode == ExecutionMode::Live
    }
}

/// Read `BINANCE_API_KEY` / `BINANCE_SECRET_KEY`; `None` if either is unset
pub fn credentials_from_env() -> Option<Credentials> {
    let api_key = std::env::var("BINANCE_API_KEY").ok()?;
    let secret_key = std::env::var("BINANCE_SECRET_KEY").ok()?;

    if api_key.is_empty() || secret_key.is_empty() {
        return None;
    }

    Some(Credentials {
        api_key,
        secret_key,
    })
}
