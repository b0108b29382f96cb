use crate::error::ExchangeError;
use crate::models::{Candle, OrderType};
use async_trait::async_trait;

/// What the exchange reports back for a filled market order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub order_id: String,
    pub price: f64,
}

/// Exchange REST surface used by the trading core
///
/// Implementations must route every call through the shared rate limiter.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderType,
        quantity: f64,
    ) -> Result<OrderFill, ExchangeError>;

    async fn ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError>;

    /// Lightweight connectivity check
    async fn ping(&self) -> Result<(), ExchangeError>;

    /// Historical candles, oldest first
    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;
}
