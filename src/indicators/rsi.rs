use super::moving_average::exponential_smoothing;

/// Calculate Relative Strength Index (RSI) for every point of the series
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Gains and losses are smoothed with Wilder's recursive average
/// (`alpha = 1 / period`). The first row counts as a zero change, so the
/// first value appears at index `period - 1`. A window without losses reads 100.
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if prices.is_empty() || period == 0 {
        return vec![None; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    gains.push(Some(0.0));
    losses.push(Some(0.0));

    // Calculate price changes
    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains.push(Some(change));
            losses.push(Some(0.0));
        } else {
            gains.push(Some(0.0));
            losses.push(Some(change.abs()));
        }
    }

    let alpha = 1.0 / period as f64;
    let avg_gains = exponential_smoothing(&gains, alpha, period);
    let avg_losses = exponential_smoothing(&losses, alpha, period);

    avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if loss == 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => {
                let rs = gain / loss;
                Some(100.0 - (100.0 / (1.0 + rs)))
            }
            _ => None,
        })
        .collect()
}
