//! MACD (Moving Average Convergence Divergence)
//!
//! MACD line = EMA(fast) - EMA(slow)
//! Signal line = EMA(signal) of the MACD line
//! Histogram = MACD line - signal line

use super::moving_average::calculate_ema_series;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD for every bar
///
/// A bar is defined once `max(fast, slow) + signal` bars of history exist.
pub fn calculate_macd_series(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<Option<Macd>> {
    let mut out = vec![None; prices.len()];
    if fast == 0 || slow == 0 || signal_period == 0 {
        return out;
    }

    let longest = fast.max(slow);
    let required = longest + signal_period;
    if prices.len() < required {
        return out;
    }

    let ema_fast = calculate_ema_series(prices, fast);
    let ema_slow = calculate_ema_series(prices, slow);

    // MACD line exists from the bar where the slower EMA is seeded
    let line_start = longest - 1;
    let line: Vec<f64> = ema_fast[line_start..]
        .iter()
        .zip(&ema_slow[line_start..])
        .filter_map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = calculate_ema_series(&line, signal_period);

    for (offset, (macd, signal)) in line.iter().zip(signal).enumerate() {
        let i = line_start + offset;
        if i + 1 < required {
            continue;
        }
        if let Some(signal) = signal {
            out[i] = Some(Macd {
                macd: *macd,
                signal,
                histogram: macd - signal,
            });
        }
    }

    out
}

/// MACD at the latest bar
///
/// Returns the neutral all-zero value when fewer than `slow + signal` bars exist.
pub fn calculate_macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    calculate_macd_series(prices, fast, slow, signal_period)
        .last()
        .copied()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ascending(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_macd_insufficient_data_is_neutral() {
        let prices = ascending(34);
        assert_eq!(calculate_macd(&prices, 12, 26, 9), Macd::default());
    }

    #[test]
    fn test_macd_warmup_boundary() {
        let prices = ascending(40);
        let series = calculate_macd_series(&prices, 12, 26, 9);

        assert!(series[..34].iter().all(Option::is_none));
        assert!(series[34..].iter().all(Option::is_some));
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let prices = ascending(60);
        let macd = calculate_macd(&prices, 12, 26, 9);

        assert!(macd.macd > 0.0);
        assert_relative_eq!(macd.histogram, macd.macd - macd.signal, epsilon = 1e-12);
    }

    #[test]
    fn test_macd_negative_in_downtrend() {
        let prices: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let macd = calculate_macd(&prices, 12, 26, 9);
        assert!(macd.macd < 0.0);
    }

    #[test]
    fn test_signal_line_is_ema_of_macd_line() {
        // Accelerating series so the MACD line keeps moving
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i * i) as f64 * 0.05).collect();
        let macd = calculate_macd(&prices, 12, 26, 9);

        // Signal lags a rising MACD line, so they must differ
        assert!(macd.macd > macd.signal);
        assert!(macd.histogram > 0.0);
    }

    #[test]
    fn test_macd_zero_periods() {
        let prices = ascending(60);
        assert!(calculate_macd_series(&prices, 0, 26, 9).iter().all(Option::is_none));
    }
}
