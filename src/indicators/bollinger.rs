//! Bollinger Bands
//!
//! Middle: SMA over `period` closes
//! Upper/Lower: middle +/- k * population standard deviation (divides by N)

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Position of `price` inside the bands: 0 at the lower band, 1 at the upper
    ///
    /// Collapsed bands (zero width) put every price on the middle, so 0.5.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            return 0.5;
        }
        (price - self.lower) / width
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Bollinger Bands over the trailing `period` prices
pub fn calculate_bollinger(prices: &[f64], period: usize, k: f64) -> Option<BollingerBands> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|p| {
            let diff = p - middle;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    let band = k * variance.sqrt();

    Some(BollingerBands {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}

pub fn calculate_bollinger_series(
    prices: &[f64],
    period: usize,
    k: f64,
) -> Vec<Option<BollingerBands>> {
    (0..prices.len())
        .map(|i| calculate_bollinger(&prices[..=i], period, k))
        .collect()
}
