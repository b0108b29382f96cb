use super::Strategy;
use crate::models::{Candle, Decision, TradingDecision};

const BREAKOUT_K: f64 = 0.5;

/// Volatility breakout against the previous bar's range
///
/// With `V = prev.high - prev.low`, a close above `prev.high + 0.5V` is a
/// STRONG_BUY and a close below `prev.low - 0.5V` is a STRONG_SELL.
#[derive(Debug, Clone, Default)]
pub struct VolatilityBreakoutStrategy;

impl Strategy for VolatilityBreakoutStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Option<TradingDecision> {
        if candles.len() < 2 {
            return None;
        }
        let prev = &candles[candles.len() - 2];
        let latest = &candles[candles.len() - 1];

        let range = prev.high - prev.low;
        if range <= 0.0 {
            return None;
        }

        let upper = prev.high + BREAKOUT_K * range;
        let lower = prev.low - BREAKOUT_K * range;

        let (decision, confidence, reason) = if latest.close > upper {
            (
                Decision::StrongBuy,
                0.95,
                format!("Close {:.2} broke above {:.2}", latest.close, upper),
            )
        } else if latest.close < lower {
            (
                Decision::StrongSell,
                0.95,
                format!("Close {:.2} broke below {:.2}", latest.close, lower),
            )
        } else {
            (
                Decision::Hold,
                0.6,
                format!("Close {:.2} inside [{:.2}, {:.2}]", latest.close, lower, upper),
            )
        };

        Some(TradingDecision::new(self.name(), decision, confidence, reason))
    }

    fn name(&self) -> &str {
        "VolatilityBreakout"
    }

    fn min_candles_required(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::candle_at;

    fn pair(close: f64) -> Vec<Candle> {
        // Previous range 100..110, thresholds 115 / 95
        vec![
            candle_at(0, 105.0, 110.0, 100.0, 105.0),
            candle_at(1, 105.0, close.max(105.0), close.min(105.0), close),
        ]
    }

    #[test]
    fn test_breakout_up() {
        let signal = VolatilityBreakoutStrategy.generate_signal(&pair(116.0)).unwrap();
        assert_eq!(signal.decision(), Decision::StrongBuy);
        assert_eq!(signal.confidence(), 0.95);
    }

    #[test]
    fn test_breakout_down() {
        let signal = VolatilityBreakoutStrategy.generate_signal(&pair(94.0)).unwrap();
        assert_eq!(signal.decision(), Decision::StrongSell);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let signal = VolatilityBreakoutStrategy.generate_signal(&pair(115.0)).unwrap();
        assert_eq!(signal.decision(), Decision::Hold);
        assert_eq!(signal.confidence(), 0.6);
    }

    #[test]
    fn test_no_signal_on_single_bar_or_flat_range() {
        let single = vec![candle_at(0, 100.0, 110.0, 90.0, 100.0)];
        assert!(VolatilityBreakoutStrategy.generate_signal(&single).is_none());

        let flat = vec![
            candle_at(0, 100.0, 100.0, 100.0, 100.0),
            candle_at(1, 100.0, 120.0, 100.0, 120.0),
        ];
        assert!(VolatilityBreakoutStrategy.generate_signal(&flat).is_none());
    }
}
