/// Calculate Simple Moving Average (SMA) for every point of the series
///
/// Entry `i` is the mean of `prices[i + 1 - period..=i]`, or `None` while
/// fewer than `period` prices are available.
pub fn calculate_sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }

    let mut series = Vec::with_capacity(prices.len());
    let mut window_sum = 0.0;

    for (i, price) in prices.iter().enumerate() {
        window_sum += price;
        if i >= period {
            window_sum -= prices[i - period];
        }

        if i + 1 >= period {
            series.push(Some(window_sum / period as f64));
        } else {
            series.push(None);
        }
    }

    series
}

/// Calculate Exponential Moving Average (EMA) for every point of the series
///
/// Uses `alpha = 2 / (period + 1)` and seeds the average with the first
/// available value (no SMA warm-up). Leading `None` values are skipped; the
/// output stays `None` until `period` values have been observed.
pub fn calculate_ema_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (period as f64 + 1.0);
    exponential_smoothing(values, alpha, period)
}

/// Recursive exponential smoothing shared by EMA and Wilder's RSI averages
///
/// `None` inputs after the first observation carry the previous average forward.
pub(crate) fn exponential_smoothing(
    values: &[Option<f64>],
    alpha: f64,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let mut series = Vec::with_capacity(values.len());
    let mut average: Option<f64> = None;
    let mut observed = 0usize;

    for value in values {
        if let Some(v) = value {
            observed += 1;
            average = Some(match average {
                Some(prev) => prev + alpha * (v - prev),
                None => *v,
            });
        }

        if observed >= min_periods.max(1) {
            series.push(average);
        } else {
            series.push(None);
        }
    }

    series
}
