use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Timestamp layout used whenever candles are serialized for the decision payload
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

/// OHLCV candlestick data for one time bucket
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Candle {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle row as delivered by the exchange, before numeric coercion
///
/// `close` is `None` when the row has no close-price column at all.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandle {
    pub timestamp: DateTime<Utc>,
    pub open: serde_json::Value,
    pub high: serde_json::Value,
    pub low: serde_json::Value,
    pub close: Option<serde_json::Value>,
    pub volume: serde_json::Value,
}

/// A candle extended with the technical indicators computed over its series
///
/// Every indicator is `None` (serialized as `null`) until its window has
/// enough history.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub candle: Candle,
    pub bb_bbm: Option<f64>,
    pub bb_bbh: Option<f64>,
    pub bb_bbl: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_diff: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_20: Option<f64>,
}

/// Trade action requested by the decision engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    OpenLong,
    OpenShort,
    Hold,
    /// Anything other than the three literals (including a missing field)
    #[default]
    #[serde(other)]
    Unknown,
}

impl TradeAction {
    /// Map a decision label; anything but the three literals is `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label {
            "open_long" => TradeAction::OpenLong,
            "open_short" => TradeAction::OpenShort,
            "hold" => TradeAction::Hold,
            _ => TradeAction::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::OpenLong => "open_long",
            TradeAction::OpenShort => "open_short",
            TradeAction::Hold => "hold",
            TradeAction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision returned by the decision engine for one tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    #[serde(rename = "decision", default)]
    pub action: TradeAction,
    #[serde(default)]
    pub reason: String,
}

/// Directional position the bot believes is open
///
/// Only the execution engine produces new values; it starts as `Flat` and is
/// never persisted, so a restart forgets whatever is open on the exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    #[serde(rename = "none")]
    Flat,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "short")]
    Short,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => f.write_str("none"),
            PositionState::Long => f.write_str("long"),
            PositionState::Short => f.write_str("short"),
        }
    }
}

/// Market order sides understood by the futures API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::OpenLong => "open_long",
            OrderSide::OpenShort => "open_short",
            OrderSide::CloseLong => "close_long",
            OrderSide::CloseShort => "close_short",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of an accepted order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub client_oid: String,
}

/// Account state fetched once per tick
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// Available margin balance used to gate trading
    pub available: f64,
    /// Full account response, forwarded verbatim to the decision engine
    pub raw: serde_json::Value,
}

/// Current Fear & Greed index reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FearGreedReading {
    pub value: String,
    pub value_classification: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_until_update: Option<String>,
}

/// News headline from the local news store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsHeadline {
    pub title: String,
    pub date: String,
}
