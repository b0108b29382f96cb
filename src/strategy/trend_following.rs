use super::Strategy;
use crate::models::{Candle, Decision, TradingDecision};

/// Trend following on moving-average alignment confirmed by MACD
///
/// - short MA above long MA and MACD positive: STRONG_BUY
/// - short MA below long MA, or MACD negative: SELL
/// - otherwise HOLD
#[derive(Debug, Clone, Default)]
pub struct TrendFollowingStrategy;

impl Strategy for TrendFollowingStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Option<TradingDecision> {
        let latest = candles.last()?;
        let short_ma = latest.short_ma?;
        let long_ma = latest.long_ma?;
        let macd = latest.macd?;

        let (decision, confidence, reason) = if short_ma > long_ma && macd > 0.0 {
            (
                Decision::StrongBuy,
                0.9,
                format!(
                    "Short MA {:.2} above long MA {:.2} with MACD {:.4} > 0",
                    short_ma, long_ma, macd
                ),
            )
        } else if short_ma < long_ma || macd < 0.0 {
            (
                Decision::Sell,
                0.8,
                format!(
                    "Bearish alignment: short MA {:.2}, long MA {:.2}, MACD {:.4}",
                    short_ma, long_ma, macd
                ),
            )
        } else {
            (
                Decision::Hold,
                0.7,
                "Moving averages flat and MACD neutral".to_string(),
            )
        };

        tracing::debug!(
            short_ma,
            long_ma,
            macd,
            %decision,
            "Trend following evaluated"
        );

        Some(TradingDecision::new(self.name(), decision, confidence, reason))
    }

    fn name(&self) -> &str {
        "TrendFollowing"
    }

    fn min_candles_required(&self) -> usize {
        // Long MA(60); MACD(12, 26, 9) needs 35
        60
    }
}
