/// Bollinger Bands
///
/// Middle band is the rolling mean of the close; the outer bands sit
/// `num_std` population standard deviations above and below it.

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn calculate_bollinger_series(prices: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let mut middle = Vec::with_capacity(prices.len());
    let mut upper = Vec::with_capacity(prices.len());
    let mut lower = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        if period == 0 || i + 1 < period {
            middle.push(None);
            upper.push(None);
            lower.push(None);
            continue;
        }

        let window = &prices[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        middle.push(Some(mean));
        upper.push(Some(mean + num_std * std_dev));
        lower.push(Some(mean - num_std * std_dev));
    }

    BollingerSeries {
        middle,
        upper,
        lower,
    }
}
