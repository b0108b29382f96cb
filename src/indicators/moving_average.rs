/// Calculate Simple Moving Average (SMA) of the trailing `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate Exponential Moving Average (EMA)
///
/// Seeded with the SMA of the first `period` prices, then smoothed with
/// multiplier `2 / (period + 1)`.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    calculate_ema_series(prices, period).last().copied().flatten()
}

/// Rolling SMA for every bar, `None` during warmup
pub fn calculate_sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(prices.len());
    if period == 0 {
        out.resize(prices.len(), None);
        return out;
    }

    let mut sum = 0.0;
    for (i, price) in prices.iter().enumerate() {
        sum += price;
        if i >= period {
            sum -= prices[i - period];
        }
        out.push((i + 1 >= period).then(|| sum / period as f64));
    }
    out
}

/// EMA for every bar, `None` during warmup
pub fn calculate_ema_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if period == 0 || prices.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Start with SMA
    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for (i, price) in prices.iter().enumerate().skip(period) {
        ema = (price - ema) * multiplier + ema;
        out[i] = Some(ema);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let sma = calculate_sma(&prices, 5);
        assert_eq!(sma, Some(104.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let prices = vec![100.0, 102.0];
        assert!(calculate_sma(&prices, 5).is_none());
        assert!(calculate_sma(&prices, 0).is_none());
    }

    #[test]
    fn test_sma_series_matches_point_sma() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 1.7).sin() * 5.0).collect();
        let series = calculate_sma_series(&prices, 7);

        for i in 0..prices.len() {
            match calculate_sma(&prices[..=i], 7) {
                Some(expected) => assert_relative_eq!(series[i].unwrap(), expected, epsilon = 1e-9),
                None => assert!(series[i].is_none()),
            }
        }
    }

    #[test]
    fn test_ema() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0, 110.0];
        let ema = calculate_ema(&prices, 5);
        assert!(ema.is_some());
        assert!(ema.unwrap() > 104.0); // EMA should be above initial SMA
    }

    #[test]
    fn test_ema_seed_and_recursion() {
        let prices = vec![1.0, 2.0, 3.0, 10.0];
        let series = calculate_ema_series(&prices, 3);

        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert_eq!(series[2], Some(2.0)); // SMA seed
        // k = 0.5: (10 - 2) * 0.5 + 2
        assert_eq!(series[3], Some(6.0));
    }
}
