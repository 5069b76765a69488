// Market data fetch: candle windows by granularity and account snapshots
pub mod fetch;
pub mod granularity;

pub use fetch::{fetch_account_snapshot, fetch_candles, normalize_rows};
pub use granularity::Granularity;
