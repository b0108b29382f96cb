use super::moving_average::calculate_sma;
use crate::models::Candle;
use serde::{Deserialize, Serialize};

const TREND_SHORT_PERIOD: usize = 20;
const TREND_LONG_PERIOD: usize = 60;
const TREND_DEAD_BAND: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    UpTrend,
    DownTrend,
    Sideways,
}

/// Classify the trend by comparing SMA(20) with SMA(60) inside a 1% dead-band
///
/// Undefined below 60 prices.
pub fn determine_trend(prices: &[f64]) -> Option<Trend> {
    let short = calculate_sma(prices, TREND_SHORT_PERIOD)?;
    let long = calculate_sma(prices, TREND_LONG_PERIOD)?;

    let trend = if short > long * (1.0 + TREND_DEAD_BAND) {
        Trend::UpTrend
    } else if short < long * (1.0 - TREND_DEAD_BAND) {
        Trend::DownTrend
    } else {
        Trend::Sideways
    };

    Some(trend)
}

fn last_two_ma_pairs(candles: &[Candle]) -> Option<((f64, f64), (f64, f64))> {
    if candles.len() < 2 {
        return None;
    }
    let prev = &candles[candles.len() - 2];
    let curr = &candles[candles.len() - 1];
    Some((
        (prev.short_ma?, prev.long_ma?),
        (curr.short_ma?, curr.long_ma?),
    ))
}

/// Short MA crossed above long MA on the latest bar
///
/// `None` unless both of the last two bars carry both moving averages.
pub fn is_golden_cross(candles: &[Candle]) -> Option<bool> {
    let ((prev_short, prev_long), (short, long)) = last_two_ma_pairs(candles)?;
    Some(prev_short <= prev_long && short > long)
}

/// Short MA crossed below long MA on the latest bar
pub fn is_dead_cross(candles: &[Candle]) -> Option<bool> {
    let ((prev_short, prev_long), (short, long)) = last_two_ma_pairs(candles)?;
    Some(prev_short >= prev_long && short < long)
}
