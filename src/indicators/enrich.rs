use crate::error::Error;
use crate::models::{Candle, IndicatorRow, RawCandle};
use crate::Result;

use super::{
    calculate_bollinger_series, calculate_ema_series, calculate_macd_series,
    calculate_rsi_series, calculate_sma_series,
};

// Windows tuned for 15-minute candles
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_STD: f64 = 2.0;
const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const SMA_PERIOD: usize = 50;
const EMA_PERIOD: usize = 20;

/// Coerce an exchange value (number or numeric string) into a float
pub fn coerce_f64(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Add the technical indicator columns to a candle table
///
/// Rows with a field that does not coerce to a finite number are dropped
/// before any indicator is computed. Fails with a data error when a row has
/// no close-price column.
pub fn add_indicators(rows: Vec<RawCandle>) -> Result<Vec<IndicatorRow>> {
    if rows.iter().any(|row| row.close.is_none()) {
        return Err(Error::Data("missing required 'close' column".to_string()));
    }

    let total = rows.len();
    let candles: Vec<Candle> = rows.iter().filter_map(coerce_row).collect();

    if candles.len() < total {
        tracing::debug!(
            "Dropped {} of {} candle rows that failed numeric coercion",
            total - candles.len(),
            total
        );
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let close_values: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();

    let bollinger = calculate_bollinger_series(&closes, BOLLINGER_PERIOD, BOLLINGER_STD);
    let rsi = calculate_rsi_series(&closes, RSI_PERIOD);
    let macd = calculate_macd_series(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let sma_50 = calculate_sma_series(&closes, SMA_PERIOD);
    let ema_20 = calculate_ema_series(&close_values, EMA_PERIOD);

    let enriched = candles
        .into_iter()
        .enumerate()
        .map(|(i, candle)| IndicatorRow {
            candle,
            bb_bbm: bollinger.middle[i],
            bb_bbh: bollinger.upper[i],
            bb_bbl: bollinger.lower[i],
            rsi: rsi[i],
            macd: macd.macd[i],
            macd_signal: macd.signal[i],
            macd_diff: macd.histogram[i],
            sma_50: sma_50[i],
            ema_20: ema_20[i],
        })
        .collect();

    Ok(enriched)
}

fn coerce_row(row: &RawCandle) -> Option<Candle> {
    Some(Candle {
        timestamp: row.timestamp,
        open: coerce_f64(&row.open)?,
        high: coerce_f64(&row.high)?,
        low: coerce_f64(&row.low)?,
        close: coerce_f64(row.close.as_ref()?)?,
        volume: coerce_f64(&row.volume)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn raw(i: i64, close: serde_json::Value) -> RawCandle {
        RawCandle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(15 * i),
            open: json!("100.0"),
            high: json!("101.0"),
            low: json!("99.0"),
            close: Some(close),
            volume: json!("12.5"),
        }
    }

    fn series(len: i64) -> Vec<RawCandle> {
        (0..len)
            .map(|i| raw(i, json!(format!("{}", 100.0 + (i % 7) as f64))))
            .collect()
    }

    #[test]
    fn test_short_series_yields_nulls_without_error() {
        let rows = add_indicators(series(10)).unwrap();

        assert_eq!(rows.len(), 10);
        for row in &rows {
            assert!(row.bb_bbm.is_none());
            assert!(row.bb_bbh.is_none());
            assert!(row.sma_50.is_none());
            assert!(row.macd.is_none());
            assert!(row.ema_20.is_none());
        }
        // RSI(14) needs 14 rows as well
        assert!(rows[9].rsi.is_none());
    }

    #[test]
    fn test_full_series_has_every_indicator_on_last_row() {
        let rows = add_indicators(series(60)).unwrap();
        let last = rows.last().unwrap();

        assert!(last.bb_bbm.is_some());
        assert!(last.bb_bbh.unwrap() >= last.bb_bbl.unwrap());
        assert!(last.rsi.is_some());
        assert!(last.macd.is_some());
        assert!(last.macd_signal.is_some());
        assert!(last.macd_diff.is_some());
        assert!(last.sma_50.is_some());
        assert!(last.ema_20.is_some());

        assert!(rows[18].bb_bbm.is_none());
        assert!(rows[19].bb_bbm.is_some());
        assert!(rows[48].sma_50.is_none());
        assert!(rows[49].sma_50.is_some());
    }

    #[test]
    fn test_rows_failing_coercion_are_dropped() {
        let mut rows = series(5);
        rows[2].close = Some(json!("not-a-number"));
        rows[3].volume = serde_json::Value::Null;

        let enriched = add_indicators(rows).unwrap();
        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[1].candle.close, 101.0);
        assert_eq!(enriched[2].candle.close, 104.0);
    }

    #[test]
    fn test_missing_close_column_is_data_error() {
        let mut rows = series(3);
        rows[1].close = None;

        let err = add_indicators(rows).unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn test_numeric_json_values_are_accepted() {
        let rows = vec![raw(0, json!(2500.5))];
        let enriched = add_indicators(rows).unwrap();
        assert_eq!(enriched[0].candle.close, 2500.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(add_indicators(Vec::new()).unwrap().is_empty());
    }
}
