// Runtime configuration: optional TOML file and TRADER__* environment
// variables layered over built-in defaults. Secrets only come from the
// environment.
use config::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::execution::TradeSettings;
use crate::market_data::Granularity;
use crate::pipeline::BotSettings;
use crate::scheduler::Schedule;
use crate::Result;

pub const DEFAULT_CONFIG_FILE: &str = "coin-trader";
pub const ENV_PREFIX: &str = "TRADER";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeCfg {
    pub base_url: String,
    pub symbol: String,
    pub margin_coin: String,
    pub product_type: String,
}

impl Default for ExchangeCfg {
    fn default() -> Self {
        Self {
            base_url: crate::exchange::bitget::BITGET_API_BASE.to_string(),
            symbol: "ETHUSDT_UMCBL".to_string(),
            margin_coin: "USDT".to_string(),
            product_type: "umcbl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketCfg {
    pub primary_granularity: String,
    pub auxiliary_granularity: String,
    pub candle_count: u32,
}

impl Default for MarketCfg {
    fn default() -> Self {
        Self {
            primary_granularity: "15m".to_string(),
            auxiliary_granularity: "30m".to_string(),
            candle_count: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingCfg {
    pub leverage: u32,
    /// Contract size per order, kept as text so it reaches the exchange unrounded
    pub trade_size: String,
    pub min_balance: f64,
}

impl Default for TradingCfg {
    fn default() -> Self {
        Self {
            leverage: 20,
            trade_size: "0.06".to_string(),
            min_balance: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecisionCfg {
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub asset_name: String,
    pub reason_language: String,
}

impl Default for DecisionCfg {
    fn default() -> Self {
        Self {
            api_url: crate::decision::openai::OPENAI_API_URL.to_string(),
            model: crate::decision::openai::MODEL.to_string(),
            timeout_secs: 30,
            asset_name: "ETH".to_string(),
            reason_language: "Korean".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentCfg {
    pub url: String,
}

impl Default for SentimentCfg {
    fn default() -> Self {
        Self {
            url: crate::api::fear_greed::FEAR_GREED_API.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsCfg {
    pub database_url: String,
    pub asset_tag: String,
    pub limit: u32,
}

impl Default for NewsCfg {
    fn default() -> Self {
        Self {
            database_url: "sqlite://Crypto_news.db".to_string(),
            asset_tag: "ETH".to_string(),
            limit: crate::context::MAX_HEADLINES as u32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleCfg {
    pub minute_offsets: Vec<u32>,
    pub poll_interval_secs: u64,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            minute_offsets: vec![0, 15, 30, 45],
            poll_interval_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingCfg {
    pub filter: String,
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            filter: "coin_trader=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeCfg,
    pub market: MarketCfg,
    pub trading: TradingCfg,
    pub decision: DecisionCfg,
    pub sentiment: SentimentCfg,
    pub news: NewsCfg,
    pub schedule: ScheduleCfg,
    pub logging: LoggingCfg,
}

impl AppConfig {
    /// Load configuration
    ///
    /// With `path` the file must exist; without it `coin-trader.toml` in the
    /// working directory is used when present. `TRADER__SECTION__KEY`
    /// variables override both.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("schedule.minute_offsets")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::new(&self.schedule.minute_offsets)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_secs.max(1))
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision.timeout_secs)
    }

    /// Validated pipeline settings
    pub fn bot_settings(&self) -> Result<BotSettings> {
        let timeframes = [
            &self.market.primary_granularity,
            &self.market.auxiliary_granularity,
        ]
        .into_iter()
        .map(|label| label.parse::<Granularity>())
        .collect::<Result<Vec<_>>>()?;

        let trade_size = Decimal::from_str(&self.trading.trade_size).map_err(|e| {
            ConfigError::Message(format!(
                "trading.trade_size '{}' is not a decimal: {}",
                self.trading.trade_size, e
            ))
        })?;
        if trade_size <= Decimal::ZERO {
            return Err(ConfigError::Message("trading.trade_size must be positive".to_string()).into());
        }

        Ok(BotSettings {
            product_type: self.exchange.product_type.clone(),
            timeframes,
            candle_count: self.market.candle_count,
            news_asset_tag: self.news.asset_tag.clone(),
            news_limit: self.news.limit,
            trade: TradeSettings {
                symbol: self.exchange.symbol.clone(),
                margin_coin: self.exchange.margin_coin.clone(),
                leverage: self.trading.leverage,
                trade_size,
                min_balance: self.trading.min_balance,
            },
        })
    }
}

/// Credentials read from the process environment
#[derive(Clone)]
pub struct Secrets {
    pub bitget_api_key: String,
    pub bitget_api_secret: String,
    pub bitget_passphrase: String,
    pub openai_api_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::Message(format!("{} not found in environment", key)))
        };

        let openai_api_key = required("OPEN_API_KEY")
            .or_else(|_| required("OPENAI_API_KEY"))
            .map_err(|_| {
                ConfigError::Message(
                    "OPEN_API_KEY (or OPENAI_API_KEY) not found in environment".to_string(),
                )
            })?;

        Ok(Self {
            bitget_api_key: required("BITGET_API_KEY")?,
            bitget_api_secret: required("BITGET_API_SECRET")?,
            bitget_passphrase: required("BITGET_PASSPHRASE")?,
            openai_api_key,
        })
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("bitget_api_key", &self.bitget_api_key)
            .field("bitget_api_secret", &"***")
            .field("bitget_passphrase", &"***")
            .field("openai_api_key", &"***")
            .finish()
    }
}
