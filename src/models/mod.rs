use crate::error::TradingError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// OHLCV candlestick with indicator values attached by the indicator engine
///
/// Derived fields stay `None` until the series has enough trailing history
/// for them; `None` means undefined, never zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub short_ma: Option<f64>,
    #[serde(default)]
    pub long_ma: Option<f64>,
    #[serde(default)]
    pub macd: Option<f64>,
    #[serde(default)]
    pub macd_signal: Option<f64>,
    #[serde(default)]
    pub bollinger_upper: Option<f64>,
    #[serde(default)]
    pub bollinger_middle: Option<f64>,
    #[serde(default)]
    pub bollinger_lower: Option<f64>,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            rsi: None,
            short_ma: None,
            long_ma: None,
            macd: None,
            macd_signal: None,
            bollinger_upper: None,
            bollinger_middle: None,
            bollinger_lower: None,
        }
    }
}

/// Discrete trading decision, strongest buy to strongest sell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Decision {
    pub fn is_buy(self) -> bool {
        matches!(self, Decision::StrongBuy | Decision::Buy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Decision::StrongSell | Decision::Sell)
    }

    pub fn is_strong(self) -> bool {
        matches!(self, Decision::StrongBuy | Decision::StrongSell)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::StrongBuy => "STRONG_BUY",
            Decision::Buy => "BUY",
            Decision::Hold => "HOLD",
            Decision::Sell => "SELL",
            Decision::StrongSell => "STRONG_SELL",
        };
        f.write_str(s)
    }
}

impl FromStr for Decision {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "STRONG_BUY" => Ok(Decision::StrongBuy),
            "BUY" => Ok(Decision::Buy),
            "HOLD" => Ok(Decision::Hold),
            "SELL" => Ok(Decision::Sell),
            "STRONG_SELL" => Ok(Decision::StrongSell),
            other => Err(TradingError::Validation(format!(
                "unknown decision '{}'",
                other
            ))),
        }
    }
}

/// A decision plus where it came from and how sure the source is
///
/// Immutable once built. "No signal" is modelled as `Option::<TradingDecision>::None`,
/// which is not the same thing as a HOLD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingDecision {
    source: String,
    decision: Decision,
    confidence: f64,
    reason: String,
}

impl TradingDecision {
    /// Confidence is clamped into [0, 1]
    pub fn new(
        source: impl Into<String>,
        decision: Decision,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            decision,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    MarketBuy,
    MarketSell,
}

impl OrderType {
    /// Map a decision onto an order side; HOLD has no order
    pub fn from_decision(decision: Decision) -> Option<Self> {
        if decision.is_buy() {
            Some(OrderType::MarketBuy)
        } else if decision.is_sell() {
            Some(OrderType::MarketSell)
        } else {
            None
        }
    }

    /// Exchange wire value for the order side
    pub fn side(self) -> &'static str {
        match self {
            OrderType::MarketBuy => "BUY",
            OrderType::MarketSell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Filled,
    Failed,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// Order record produced by one execution call
///
/// Status only moves forward: `Pending -> Filled | Failed | Rejected`.
/// Once terminal, every transition method returns `InvalidTransition`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOrder {
    pub id: Uuid,
    pub symbol: String,
    pub quantity: f64,
    pub leverage: u32,
    pub order_type: Option<OrderType>,
    status: OrderStatus,
    executed_price: Option<f64>,
    total_cost: Option<f64>,
    margin: Option<f64>,
    exchange_order_id: Option<String>,
    failure_reason: Option<String>,
    pub simulated: bool,
    pub created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TradeOrder {
    pub fn pending(
        symbol: impl Into<String>,
        quantity: f64,
        leverage: u32,
        order_type: Option<OrderType>,
        simulated: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            quantity,
            leverage,
            order_type,
            status: OrderStatus::Pending,
            executed_price: None,
            total_cost: None,
            margin: None,
            exchange_order_id: None,
            failure_reason: None,
            simulated,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn executed_price(&self) -> Option<f64> {
        self.executed_price
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.total_cost
    }

    /// Margin actually committed for a leveraged order
    pub fn margin(&self) -> Option<f64> {
        self.margin
    }

    pub fn exchange_order_id(&self) -> Option<&str> {
        self.exchange_order_id.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn transition(&mut self, to: OrderStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TradingError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub(crate) fn fill(&mut self, price: f64, exchange_order_id: impl Into<String>) -> Result<()> {
        self.transition(OrderStatus::Filled)?;
        self.executed_price = Some(price);
        self.total_cost = Some(price * self.quantity);
        self.exchange_order_id = Some(exchange_order_id.into());
        Ok(())
    }

    /// Fill a leveraged order: cost is the full position, margin is position / leverage
    pub(crate) fn fill_leveraged(
        &mut self,
        price: f64,
        exchange_order_id: impl Into<String>,
    ) -> Result<()> {
        self.fill(price, exchange_order_id)?;
        self.margin = self.total_cost.map(|position| position / self.leverage as f64);
        Ok(())
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(OrderStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    pub(crate) fn reject(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(OrderStatus::Rejected)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_classification() {
        assert!(Decision::StrongBuy.is_buy());
        assert!(Decision::Buy.is_buy());
        assert!(Decision::Sell.is_sell());
        assert!(Decision::StrongSell.is_strong());
        assert!(!Decision::Hold.is_buy());
        assert!(!Decision::Hold.is_sell());
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!("strong_buy".parse::<Decision>().unwrap(), Decision::StrongBuy);
        assert_eq!("STRONG-SELL".parse::<Decision>().unwrap(), Decision::StrongSell);
        assert_eq!(" hold ".parse::<Decision>().unwrap(), Decision::Hold);
        assert!("moon".parse::<Decision>().is_err());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let d = TradingDecision::new("test", Decision::Buy, 1.7, "overconfident");
        assert_eq!(d.confidence(), 1.0);

        let d = TradingDecision::new("test", Decision::Sell, -0.2, "negative");
        assert_eq!(d.confidence(), 0.0);
    }

    #[test]
    fn test_order_type_mapping() {
        assert_eq!(OrderType::from_decision(Decision::StrongBuy), Some(OrderType::MarketBuy));
        assert_eq!(OrderType::from_decision(Decision::Sell), Some(OrderType::MarketSell));
        assert_eq!(OrderType::from_decision(Decision::Hold), None);
    }

    #[test]
    fn test_order_fill_sets_cost() {
        let mut order = TradeOrder::pending("BTCUSDT", 2.0, 1, Some(OrderType::MarketBuy), true);
        order.fill(100.0, "SIM-1").unwrap();

        assert_eq!(order.status(), OrderStatus::Filled);
        assert_eq!(order.executed_price(), Some(100.0));
        assert_eq!(order.total_cost(), Some(200.0));
        assert_eq!(order.exchange_order_id(), Some("SIM-1"));
    }

    #[test]
    fn test_terminal_order_is_immutable() {
        let mut order = TradeOrder::pending("BTCUSDT", 1.0, 1, Some(OrderType::MarketSell), false);
        order.fail("boom").unwrap();

        let err = order.fill(100.0, "late").unwrap_err();
        assert!(matches!(
            err,
            TradingError::InvalidTransition {
                from: OrderStatus::Failed,
                to: OrderStatus::Filled
            }
        ));
        assert_eq!(order.status(), OrderStatus::Failed);
        assert_eq!(order.executed_price(), None);
    }

    #[test]
    fn test_leveraged_fill_computes_margin() {
        let mut order = TradeOrder::pending("BTCUSDT", 2.0, 5, Some(OrderType::MarketBuy), true);
        order.fill_leveraged(100.0, "SIM-LEV").unwrap();

        assert_eq!(order.total_cost(), Some(200.0));
        assert_eq!(order.margin(), Some(40.0));
    }
}
