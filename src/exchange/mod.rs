// Futures exchange access: the trait the pipeline talks to, the Bitget REST
// client and a dry-run wrapper that never sends writes
pub mod bitget;
pub mod dry_run;

pub use bitget::{BitgetClient, BitgetCredentials};
pub use dry_run::DryRunExchange;

use crate::market_data::Granularity;
use crate::models::{OrderAck, OrderSide};
use crate::Result;
use rust_decimal::Decimal;

/// Market order for the traded contract
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub margin_coin: String,
    pub side: OrderSide,
    pub size: Decimal,
}

/// Operations the bot consumes from a futures exchange
///
/// Calls are made one at a time from the scheduler task, so implementations
/// do not need to be shared across threads.
#[allow(async_fn_in_trait)]
pub trait Exchange {
    /// Exchange server time in epoch milliseconds
    async fn server_time(&self) -> Result<i64>;

    /// Raw candle rows `[ts, open, high, low, close, volume, ...]` in `[start_ms, end_ms]`
    async fn candles(
        &self,
        symbol: &str,
        granularity: Granularity,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Vec<serde_json::Value>>>;

    /// Full account response for a product type
    async fn accounts(&self, product_type: &str) -> Result<serde_json::Value>;

    async fn set_leverage(&self, symbol: &str, margin_coin: &str, leverage: u32) -> Result<()>;

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck>;
}
