use super::bollinger::calculate_bollinger_series;
use super::macd::{calculate_macd_series, DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use super::moving_average::calculate_sma_series;
use super::rsi::calculate_rsi_series;
use crate::models::Candle;
use serde::{Deserialize, Serialize};

/// Periods used when annotating a candle series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub short_ma_period: usize,
    pub long_ma_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            short_ma_period: 20,
            long_ma_period: 60,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            bollinger_period: 20,
            bollinger_k: 2.0,
        }
    }
}

impl IndicatorConfig {
    /// Bars needed before every derived field is defined on the latest candle
    pub fn warmup_bars(&self) -> usize {
        [
            self.rsi_period + 1,
            self.short_ma_period,
            self.long_ma_period,
            self.macd_fast.max(self.macd_slow) + self.macd_signal,
            self.bollinger_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Extract close prices (oldest first)
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Annotate every candle with RSI, moving averages, MACD and Bollinger Bands
///
/// Runs in that fixed order over the whole series. Every derived field is
/// recomputed from closes, so applying it twice gives identical candles.
pub fn calculate_all_indicators(candles: &mut [Candle], config: &IndicatorConfig) {
    let prices = closes(candles);

    let rsi = calculate_rsi_series(&prices, config.rsi_period);
    let short_ma = calculate_sma_series(&prices, config.short_ma_period);
    let long_ma = calculate_sma_series(&prices, config.long_ma_period);
    let macd = calculate_macd_series(
        &prices,
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    );
    let bollinger =
        calculate_bollinger_series(&prices, config.bollinger_period, config.bollinger_k);

    for (i, candle) in candles.iter_mut().enumerate() {
        candle.rsi = rsi[i];
        candle.short_ma = short_ma[i];
        candle.long_ma = long_ma[i];
        candle.macd = macd[i].map(|m| m.macd);
        candle.macd_signal = macd[i].map(|m| m.signal);
        candle.bollinger_upper = bollinger[i].map(|b| b.upper);
        candle.bollinger_middle = bollinger[i].map(|b| b.middle);
        candle.bollinger_lower = bollinger[i].map(|b| b.lower);
    }

    tracing::debug!(bars = candles.len(), "Annotated candle series with indicators");
}
