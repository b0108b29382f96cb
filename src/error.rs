use crate::models::{OrderStatus, TradeOrder};
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the exchange REST API
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Exchange unreachable, connection reset, timeout
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Exchange answered with a non-success HTTP status
    #[error("exchange returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Payload did not have the expected shape
    #[error("unexpected response payload: {0}")]
    Parse(String),

    /// Missing or unusable API credentials for a signed endpoint
    #[error("authentication error: {0}")]
    Auth(String),
}

impl From<serde_json::Error> for ExchangeError {
    fn from(e: serde_json::Error) -> Self {
        ExchangeError::Parse(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TradingError {
    /// Bad quantity or leverage, raised before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// Only surfaced from the non-blocking acquire path
    #[error("rate limit exhausted: {used}/{capacity} permits used, window resets in {resets_in:?}")]
    RateLimitExhausted {
        used: u32,
        capacity: u32,
        resets_in: Duration,
    },

    /// A live order was submitted and failed; the order is already marked FAILED
    #[error("order execution failed for {}: {source}", order.symbol)]
    Execution {
        order: Box<TradeOrder>,
        #[source]
        source: ExchangeError,
    },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("order already terminal ({from:?}), cannot move to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<redis::RedisError> for TradingError {
    fn from(e: redis::RedisError) -> Self {
        TradingError::Cache(e.to_string())
    }
}

impl From<serde_json::Error> for TradingError {
    fn from(e: serde_json::Error) -> Self {
        TradingError::Cache(e.to_string())
    }
}
