use super::Strategy;
use crate::models::{Candle, Decision, TradingDecision};

/// Dollar Cost Averaging (DCA) strategy
///
/// Scales into the market on weakness, judged by RSI of the latest candle:
/// - RSI below `strong_buy_below` (30): STRONG_BUY
/// - RSI below `buy_below` (40): BUY
/// - otherwise HOLD
///
/// Never sells.
#[derive(Debug, Clone)]
pub struct DcaStrategy {
    strong_buy_below: f64,
    buy_below: f64,
}

impl DcaStrategy {
    pub fn new(strong_buy_below: f64, buy_below: f64) -> Self {
        Self {
            strong_buy_below,
            buy_below,
        }
    }
}

impl Default for DcaStrategy {
    fn default() -> Self {
        Self::new(30.0, 40.0)
    }
}

impl Strategy for DcaStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Option<TradingDecision> {
        let rsi = candles.last()?.rsi?;

        let (decision, confidence, reason) = if rsi < self.strong_buy_below {
            (
                Decision::StrongBuy,
                0.9,
                format!("RSI {:.1} deeply oversold, accumulate aggressively", rsi),
            )
        } else if rsi < self.buy_below {
            (
                Decision::Buy,
                0.7,
                format!("RSI {:.1} in accumulation zone", rsi),
            )
        } else {
            (
                Decision::Hold,
                0.8,
                format!("RSI {:.1} above accumulation zone", rsi),
            )
        };

        tracing::debug!("🔍 DCA: RSI={:.1} -> {}", rsi, decision);
        Some(TradingDecision::new(self.name(), decision, confidence, reason))
    }

    fn name(&self) -> &str {
        "DCA"
    }

    fn min_candles_required(&self) -> usize {
        15 // RSI(14) needs 15 closes
    }
}
