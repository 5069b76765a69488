use crate::market_data::Granularity;
use crate::models::{AccountSnapshot, FearGreedReading, IndicatorRow, NewsHeadline};
use crate::Result;
use serde_json::{Map, Value};

pub const MAX_HEADLINES: usize = 5;

/// Enriched candle table for one timeframe
#[derive(Debug, Clone)]
pub struct TimeframeTable {
    pub granularity: Granularity,
    pub rows: Vec<IndicatorRow>,
}

/// Everything the decision engine sees for one tick
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub account: AccountSnapshot,
    pub timeframes: Vec<TimeframeTable>,
    pub fear_greed: Option<FearGreedReading>,
    pub news: Vec<NewsHeadline>,
}

impl DecisionContext {
    /// Build the JSON payload sent as the user message
    ///
    /// Keys: `investment_status`, `ohlcv_<granularity>` per timeframe,
    /// `fear_greed_index`, `news` (at most 5) and `wallet_balance`.
    pub fn to_payload(&self) -> Result<Value> {
        let mut payload = Map::new();

        payload.insert("investment_status".to_string(), self.account.raw.clone());

        for table in &self.timeframes {
            payload.insert(
                format!("ohlcv_{}", table.granularity),
                serde_json::to_value(&table.rows)?,
            );
        }

        payload.insert(
            "fear_greed_index".to_string(),
            serde_json::to_value(&self.fear_greed)?,
        );

        let news: Vec<&NewsHeadline> = self.news.iter().take(MAX_HEADLINES).collect();
        payload.insert("news".to_string(), serde_json::to_value(news)?);

        payload.insert(
            "wallet_balance".to_string(),
            serde_json::to_value(self.account.available)?,
        );

        Ok(Value::Object(payload))
    }
}
