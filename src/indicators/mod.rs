// Technical indicators module
// Implements RSI, SMA/EMA, MACD, Bollinger Bands and trend classification

pub mod annotate;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod trend;

pub use annotate::{calculate_all_indicators, closes, IndicatorConfig};
pub use bollinger::{calculate_bollinger, calculate_bollinger_series, BollingerBands};
pub use macd::{calculate_macd, calculate_macd_series, Macd};
pub use moving_average::{calculate_ema, calculate_ema_series, calculate_sma, calculate_sma_series};
pub use rsi::{calculate_rsi, calculate_rsi_series};
pub use trend::{determine_trend, is_dead_cross, is_golden_cross, Trend};
