use super::moving_average::calculate_ema_series;

/// MACD line, signal line and histogram, aligned with the input prices
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Calculate Moving Average Convergence Divergence
///
/// MACD = EMA(fast) - EMA(slow); the signal is an EMA of the MACD line that
/// starts once the MACD line exists, so with 12/26/9 the first signal value
/// lands on index 33.
pub fn calculate_macd_series(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let closes: Vec<Option<f64>> = prices.iter().copied().map(Some).collect();
    let fast = calculate_ema_series(&closes, fast_period);
    let slow = calculate_ema_series(&closes, slow_period);

    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = calculate_ema_series(&macd, signal_period);

    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}
