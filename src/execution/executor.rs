use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ExchangeClient;
use crate::error::TradingError;
use crate::models::{OrderType, TradeOrder, TradingDecision};
use crate::Result;

/// Platform ceiling; configuration can lower it but never raise it
pub const HARD_MAX_LEVERAGE: u32 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Simulation,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Quantity used by the trading loop for each order
    pub order_quantity: f64,
    /// Leverage used by the trading loop (1 = spot)
    pub leverage: u32,
    pub max_leverage: u32,
    /// Orders must be strictly below this quantity
    pub max_quantity: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Simulation,
            order_quantity: 0.001,
            leverage: 1,
            max_leverage: 10,
            max_quantity: 1_000.0,
        }
    }
}

impl ExecutionConfig {
    fn effective_max_leverage(&self) -> u32 {
        self.max_leverage.clamp(1, HARD_MAX_LEVERAGE)
    }

    /// Order limits: `0 < quantity < max_quantity`, `1 <= leverage <= max`
    pub fn check_order(&self, quantity: f64, leverage: u32) -> Result<()> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(TradingError::Validation(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }
        if quantity >= self.max_quantity {
            return Err(TradingError::Validation(format!(
                "quantity {} exceeds ceiling {}",
                quantity, self.max_quantity
            )));
        }

        let max = self.effective_max_leverage();
        if leverage < 1 || leverage > max {
            return Err(TradingError::Validation(format!(
                "leverage {} outside [1, {}]",
                leverage, max
            )));
        }

        Ok(())
    }
}

/// Turns a merged decision into a terminal `TradeOrder`
///
/// Spot orders in live mode go to the exchange. Leveraged orders are always
/// simulated, even in live mode: there is no margin order path yet, so they
/// are priced from the ticker and flagged `simulated`.
pub struct OrderExecutor {
    exchange: Arc<dyn ExchangeClient>,
    symbol: String,
    config: ExecutionConfig,
}

impl OrderExecutor {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        symbol: impl Into<String>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            config,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.config.mode
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Check quantity and leverage before anything touches the network
    pub fn validate(&self, quantity: f64, leverage: u32) -> Result<()> {
        self.config.check_order(quantity, leverage)
    }

    /// Execute one decision
    ///
    /// - Validation problems: `Err(Validation)`, nothing sent.
    /// - HOLD: `Ok` with a REJECTED order, nothing sent.
    /// - Simulation: always `Ok`; FILLED, or FAILED if no reference price.
    /// - Live spot failure: `Err(Execution)` carrying the FAILED order.
    pub async fn execute(
        &self,
        decision: &TradingDecision,
        quantity: f64,
        leverage: u32,
    ) -> Result<TradeOrder> {
        self.validate(quantity, leverage)?;

        let order_type = OrderType::from_decision(decision.decision());
        let simulated = self.config.mode == ExecutionMode::Simulation || leverage > 1;
        let mut order = TradeOrder::pending(
            self.symbol.clone(),
            quantity,
            leverage,
            order_type,
            simulated,
        );

        let Some(order_type) = order_type else {
            order.reject(format!("{} is not an actionable decision", decision.decision()))?;
            tracing::info!(
                order_id = %order.id,
                decision = %decision.decision(),
                "Order rejected, nothing to execute"
            );
            return Ok(order);
        };

        if leverage > 1 {
            if self.config.mode == ExecutionMode::Live {
                tracing::warn!(
                    leverage,
                    "Leveraged orders are not placed on the exchange; simulating"
                );
            }
            self.simulate(order, true).await
        } else if self.config.mode == ExecutionMode::Simulation {
            self.simulate(order, false).await
        } else {
            self.execute_live(order, order_type).await
        }
    }

    async fn simulate(&self, mut order: TradeOrder, leveraged: bool) -> Result<TradeOrder> {
        match self.exchange.ticker_price(&self.symbol).await {
            Ok(price) => {
                let sim_id = format!("SIM-{}", Uuid::new_v4());
                if leveraged {
                    order.fill_leveraged(price, sim_id)?;
                } else {
                    order.fill(price, sim_id)?;
                }
                tracing::info!(
                    order_id = %order.id,
                    symbol = %order.symbol,
                    side = ?order.order_type,
                    price,
                    quantity = order.quantity,
                    leverage = order.leverage,
                    margin = ?order.margin(),
                    "📝 Simulated order filled"
                );
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order.id,
                    "Simulated order failed, no reference price: {}",
                    e
                );
                order.fail(e.to_string())?;
            }
        }

        Ok(order)
    }

    async fn execute_live(
        &self,
        mut order: TradeOrder,
        order_type: OrderType,
    ) -> Result<TradeOrder> {
        match self
            .exchange
            .place_market_order(&self.symbol, order_type, order.quantity)
            .await
        {
            Ok(fill) => {
                order.fill(fill.price, fill.order_id)?;
                tracing::info!(
                    order_id = %order.id,
                    exchange_order_id = ?order.exchange_order_id(),
                    symbol = %order.symbol,
                    side = order_type.side(),
                    price = fill.price,
                    quantity = order.quantity,
                    "💹 Live order filled"
                );
                Ok(order)
            }
            Err(e) => {
                order.fail(e.to_string())?;
                tracing::error!(order_id = %order.id, "Live order failed: {}", e);
                Err(TradingError::Execution {
                    order: Box::new(order),
                    source: e,
                })
            }
        }
    }

    /// Whether an order could be placed right now
    ///
    /// Simulation is always ready; live mode pings the exchange.
    pub async fn can_place_order(&self) -> bool {
        match self.config.mode {
            ExecutionMode::Simulation => true,
            ExecutionMode::Live => match self.exchange.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Exchange connectivity check failed: {}", e);
                    false
                }
            },
        }
    }
}
