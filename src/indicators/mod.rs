// Technical indicators module
// Implements Bollinger Bands, RSI, MACD, SMA, EMA as full series over the close

pub mod bollinger;
pub mod enrich;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use bollinger::{calculate_bollinger_series, BollingerSeries};
pub use enrich::{add_indicators, coerce_f64};
pub use macd::{calculate_macd_series, MacdSeries};
pub use moving_average::{calculate_ema_series, calculate_sma_series};
pub use rsi::calculate_rsi_series;
