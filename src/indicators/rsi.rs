/// Calculate Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions. Uses simple averages of gains and
/// losses over the trailing `period` changes.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Returns `None` with fewer than `period + 1` prices. There is no neutral
/// 50 fallback; callers must treat `None` as undefined.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];

    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), change| {
            if change > 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses + change.abs())
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// RSI for every bar of the series, `None` where history is too short
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| calculate_rsi(&prices[..=i], period))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_calculation() {
        // Test with known values
        let prices = vec![
            44.0, 44.25, 44.5, 43.75, 44.0, 44.5, 45.0, 45.5, 45.25, 45.5, 46.0, 46.5, 46.25,
            46.0, 46.5,
        ];

        let rsi = calculate_rsi(&prices, 14);
        assert!(rsi.is_some());

        let rsi_value = rsi.unwrap();
        assert!(rsi_value > 0.0 && rsi_value < 100.0);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let prices = vec![100.0, 102.0, 101.0];
        assert!(calculate_rsi(&prices, 14).is_none());

        // Exactly `period` prices is still one short
        let prices: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert!(calculate_rsi(&prices, 14).is_none());
    }

    #[test]
    fn test_rsi_all_gains() {
        let prices = vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        let rsi = calculate_rsi(&prices, 5);
        assert_eq!(rsi, Some(100.0)); // All gains = RSI 100
    }

    #[test]
    fn test_rsi_all_losses() {
        let prices: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let rsi = calculate_rsi(&prices, 14);
        assert_eq!(rsi, Some(0.0));
    }

    #[test]
    fn test_rsi_only_uses_trailing_window() {
        // Big crash early on, then steady gains over the last 5 changes
        let mut prices = vec![500.0, 100.0];
        prices.extend((1..=5).map(|i| 100.0 + i as f64));

        assert_eq!(calculate_rsi(&prices, 5), Some(100.0));
    }

    #[test]
    fn test_rsi_bounded() {
        let prices: Vec<f64> = (0..100)
            .map(|i| 100.0 + ((i * 37) % 11) as f64 - 5.0)
            .collect();

        for value in calculate_rsi_series(&prices, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_series_warmup() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi_series(&prices, 14);

        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14..].iter().all(Option::is_some));
    }
}
