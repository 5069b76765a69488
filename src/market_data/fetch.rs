use chrono::DateTime;

use crate::error::Error;
use crate::exchange::Exchange;
use crate::indicators::{add_indicators, coerce_f64};
use crate::models::{AccountSnapshot, IndicatorRow, RawCandle};
use crate::Result;

use super::Granularity;

/// Fetch `count` candles ending at exchange server time and enrich them
///
/// The granularity label is validated before any network call. Fails with a
/// data error when the exchange returns no candles.
pub async fn fetch_candles<E: Exchange>(
    exchange: &E,
    symbol: &str,
    granularity: &str,
    count: u32,
) -> Result<Vec<IndicatorRow>> {
    let granularity: Granularity = granularity.parse()?;

    let server_time = exchange.server_time().await?;
    let (start_ms, end_ms) = granularity.time_window(server_time, count)?;

    tracing::debug!(
        "Fetching {} {} candles for {} ({} → {})",
        count,
        granularity,
        symbol,
        start_ms,
        end_ms
    );

    let rows = exchange
        .candles(symbol, granularity, start_ms, end_ms)
        .await?;

    if rows.is_empty() {
        return Err(Error::Data(format!(
            "no {} candle data returned for {}",
            granularity, symbol
        )));
    }

    let candles = normalize_rows(rows);
    let enriched = add_indicators(candles)?;

    tracing::debug!("Enriched {} {} candles for {}", enriched.len(), granularity, symbol);

    Ok(enriched)
}

/// Convert raw exchange rows into timestamped candles, oldest first
///
/// Rows whose timestamp is not a valid epoch-millisecond value are skipped.
/// Columns after volume are ignored.
pub fn normalize_rows(rows: Vec<Vec<serde_json::Value>>) -> Vec<RawCandle> {
    let mut candles: Vec<RawCandle> = rows
        .into_iter()
        .filter_map(|row| {
            let timestamp = row
                .first()
                .and_then(coerce_f64)
                .and_then(|ms| DateTime::from_timestamp_millis(ms as i64));

            let Some(timestamp) = timestamp else {
                tracing::warn!("Skipping candle row with invalid timestamp: {:?}", row.first());
                return None;
            };

            let column = |i: usize| row.get(i).cloned().unwrap_or(serde_json::Value::Null);

            Some(RawCandle {
                timestamp,
                open: column(1),
                high: column(2),
                low: column(3),
                close: row.get(4).cloned(),
                volume: column(5),
            })
        })
        .collect();

    candles.sort_by_key(|c| c.timestamp);
    candles
}

/// Fetch the account snapshot used to gate trading for this tick
///
/// The available balance comes from the entry for `margin_coin`, falling back
/// to the first entry; it is 0 when the exchange lists no accounts.
pub async fn fetch_account_snapshot<E: Exchange>(
    exchange: &E,
    product_type: &str,
    margin_coin: &str,
) -> Result<AccountSnapshot> {
    let raw = exchange.accounts(product_type).await?;
    let available = available_balance(&raw, margin_coin);

    Ok(AccountSnapshot { available, raw })
}

fn available_balance(raw: &serde_json::Value, margin_coin: &str) -> f64 {
    let Some(accounts) = raw.get("data").and_then(|d| d.as_array()) else {
        return 0.0;
    };

    let account = accounts
        .iter()
        .find(|a| a.get("marginCoin").and_then(|c| c.as_str()) == Some(margin_coin))
        .or_else(|| accounts.first());

    account
        .and_then(|a| a.get("available"))
        .and_then(coerce_f64)
        .unwrap_or(0.0)
}
