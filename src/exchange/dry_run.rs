use crate::exchange::{Exchange, OrderRequest};
use crate::market_data::Granularity;
use crate::models::OrderAck;
use crate::Result;

/// Wraps an exchange so that reads go through and writes are only logged
pub struct DryRunExchange<E> {
    inner: E,
}

impl<E: Exchange> DryRunExchange<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: Exchange> Exchange for DryRunExchange<E> {
    async fn server_time(&self) -> Result<i64> {
        self.inner.server_time().await
    }

    async fn candles(
        &self,
        symbol: &str,
        granularity: Granularity,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Vec<serde_json::Value>>> {
        self.inner.candles(symbol, granularity, start_ms, end_ms).await
    }

    async fn accounts(&self, product_type: &str) -> Result<serde_json::Value> {
        self.inner.accounts(product_type).await
    }

    async fn set_leverage(&self, symbol: &str, margin_coin: &str, leverage: u32) -> Result<()> {
        tracing::info!(
            "  → [DRY RUN] Would set leverage {}x on {} ({})",
            leverage,
            symbol,
            margin_coin
        );
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let client_oid = uuid::Uuid::new_v4().simple().to_string();
        tracing::info!(
            "  → [DRY RUN] Would place {} {} {} (market)",
            order.side,
            order.size,
            order.symbol
        );
        Ok(OrderAck {
            order_id: format!("dry-run-{}", client_oid),
            client_oid,
        })
    }
}
