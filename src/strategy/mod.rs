// Trading strategy module
pub mod arbiter;
pub mod dca;
pub mod swing;
pub mod trend_following;
pub mod volatility_breakout;

use crate::error::TradingError;
use crate::models::{Candle, TradingDecision};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use arbiter::arbitrate;
pub use dca::DcaStrategy;
pub use swing::SwingTradingStrategy;
pub use trend_following::TrendFollowingStrategy;
pub use volatility_breakout::VolatilityBreakoutStrategy;

/// Base trait for all trading strategies
///
/// Strategies read the indicator fields of an annotated series (see
/// [`crate::indicators::calculate_all_indicators`]) and judge the latest bar.
pub trait Strategy: Send + Sync {
    /// Evaluate the latest candle; `None` means no signal (not HOLD)
    fn generate_signal(&self, candles: &[Candle]) -> Option<TradingDecision>;

    /// Get strategy name, also used as the decision source
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}

/// Strategy identifier used by configuration and the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Dca,
    #[default]
    TrendFollowing,
    SwingTrading,
    VolatilityBreakout,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Dca,
        StrategyKind::TrendFollowing,
        StrategyKind::SwingTrading,
        StrategyKind::VolatilityBreakout,
    ];

    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Dca => Box::new(DcaStrategy::default()),
            StrategyKind::TrendFollowing => Box::new(TrendFollowingStrategy),
            StrategyKind::SwingTrading => Box::new(SwingTradingStrategy),
            StrategyKind::VolatilityBreakout => Box::new(VolatilityBreakoutStrategy),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Dca => "dca",
            StrategyKind::TrendFollowing => "trend_following",
            StrategyKind::SwingTrading => "swing_trading",
            StrategyKind::VolatilityBreakout => "volatility_breakout",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| TradingError::Validation(format!("unknown strategy '{}'", s)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::Candle;
    use chrono::{Duration, TimeZone, Utc};

    pub fn candle(close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Candle::new(ts, close, close, close, close, 1000.0)
    }

    pub fn candle_at(hour: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
        Candle::new(ts, open, high, low, close, 1000.0)
    }
}
