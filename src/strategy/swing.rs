use super::Strategy;
use crate::models::{Candle, Decision, TradingDecision};

/// Swing trading on Bollinger Band proximity
///
/// Buys near the lower band and sells near the upper band. The tighter
/// zone (within 3% of a band) gives the STRONG variant.
#[derive(Debug, Clone, Default)]
pub struct SwingTradingStrategy;

impl Strategy for SwingTradingStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Option<TradingDecision> {
        let latest = candles.last()?;
        let upper = latest.bollinger_upper?;
        let lower = latest.bollinger_lower?;
        let price = latest.close;

        let (decision, confidence, reason) = if price <= lower * 1.03 {
            (
                Decision::StrongBuy,
                0.9,
                format!("Price {:.2} within 3% of lower band {:.2}", price, lower),
            )
        } else if price <= lower * 1.05 {
            (
                Decision::Buy,
                0.8,
                format!("Price {:.2} within 5% of lower band {:.2}", price, lower),
            )
        } else if price >= upper * 0.97 {
            (
                Decision::StrongSell,
                0.9,
                format!("Price {:.2} within 3% of upper band {:.2}", price, upper),
            )
        } else if price >= upper * 0.95 {
            (
                Decision::Sell,
                0.8,
                format!("Price {:.2} within 5% of upper band {:.2}", price, upper),
            )
        } else {
            (Decision::Hold, 0.7, "Price mid-band".to_string())
        };

        tracing::debug!(
            price,
            lower,
            upper,
            %decision,
            "Swing trading evaluated"
        );

        Some(TradingDecision::new(self.name(), decision, confidence, reason))
    }

    fn name(&self) -> &str {
        "SwingTrading"
    }

    fn min_candles_required(&self) -> usize {
        20
    }
}
