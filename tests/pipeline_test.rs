use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use coin_trader::api::FearGreedClient;
use coin_trader::decision::{system_prompt, OpenAIDecisionEngine};
use coin_trader::exchange::{BitgetClient, BitgetCredentials, DryRunExchange};
use coin_trader::execution::TradeSettings;
use coin_trader::market_data::Granularity;
use coin_trader::news::SqliteNewsStore;
use coin_trader::scheduler::{self, Clock, ClockTicker, Schedule};
use coin_trader::*;
use mockito::{Matcher, Mock, ServerGuard};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const SERVER_TIME_MS: i64 = 1_717_236_000_000;

fn credentials() -> BitgetCredentials {
    BitgetCredentials {
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
        passphrase: "pass".to_string(),
    }
}

fn settings() -> BotSettings {
    BotSettings {
        product_type: "umcbl".to_string(),
        timeframes: vec![Granularity::FifteenMinutes, Granularity::ThirtyMinutes],
        candle_count: 200,
        news_asset_tag: "ETH".to_string(),
        news_limit: 5,
        trade: TradeSettings {
            symbol: "ETHUSDT_UMCBL".to_string(),
            margin_coin: "USDT".to_string(),
            leverage: 20,
            trade_size: Decimal::new(6, 2),
            min_balance: 10.0,
        },
    }
}

/// 200 rows of `[ts, open, high, low, close, base_vol, quote_vol]` as strings
fn candle_body() -> String {
    let rows: Vec<serde_json::Value> = (0..200)
        .map(|i: i64| {
            let close = 3000.0 + ((i * 13) % 40) as f64;
            serde_json::json!([
                (SERVER_TIME_MS - (200 - i) * 900_000).to_string(),
                (close - 1.0).to_string(),
                (close + 4.0).to_string(),
                (close - 4.0).to_string(),
                close.to_string(),
                "15.2",
                "45600"
            ])
        })
        .collect();
    serde_json::Value::Array(rows).to_string()
}

/// Read-side Bitget endpoints shared by every scenario
async fn mock_market(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        server
            .mock("GET", "/api/spot/v1/public/time")
            .with_body(format!(r#"{{"code":"00000","msg":"success","data":"{}"}}"#, SERVER_TIME_MS))
            .expect_at_least(1)
            .create_async()
            .await,
        server
            .mock("GET", Matcher::Regex(r"^/api/mix/v1/market/candles".to_string()))
            .match_query(Matcher::UrlEncoded("symbol".into(), "ETHUSDT_UMCBL".into()))
            .with_body(candle_body())
            .expect_at_least(2)
            .create_async()
            .await,
        server
            .mock("GET", Matcher::Regex(r"^/api/mix/v1/account/accounts".to_string()))
            .with_body(r#"{"code":"00000","msg":"success","data":[{"marginCoin":"USDT","available":"512.5","equity":"600"}]}"#)
            .create_async()
            .await,
        server
            .mock("GET", "/fng/")
            .with_body(r#"{"name":"Fear and Greed Index","data":[{"value":"74","value_classification":"Greed","timestamp":"1717200000","time_until_update":"3600"}]}"#)
            .create_async()
            .await,
    ]
}

async fn mock_decision(server: &mut ServerGuard, decision: &str) -> Mock {
    let content = serde_json::json!({"decision": decision, "reason": "MACD 골든크로스"}).to_string();
    let body = serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]});

    server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("ohlcv_15m".to_string()))
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn news_store() -> SqliteNewsStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("CREATE TABLE crypto_news (title TEXT, published_date TEXT, crypto_type TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO crypto_news VALUES ('Ether ETF approved', '2024-05-23 20:00:00', 'ETH')")
        .execute(&pool)
        .await
        .unwrap();
    SqliteNewsStore::from_pool(pool)
}

fn engine(server: &ServerGuard) -> OpenAIDecisionEngine {
    OpenAIDecisionEngine::new(
        "sk-test".to_string(),
        system_prompt("ETH", 20, 15, "Korean"),
    )
    .with_api_url(format!("{}/v1/chat/completions", server.url()))
}

#[tokio::test]
async fn test_tick_switches_short_to_long_on_bitget() {
    let mut server = mockito::Server::new_async().await;
    let _market = mock_market(&mut server).await;
    let decision = mock_decision(&mut server, "open_long").await;

    let leverage = server
        .mock("POST", "/api/mix/v1/account/setLeverage")
        .match_body(Matcher::PartialJsonString(r#"{"leverage":"20"}"#.to_string()))
        .with_body(r#"{"code":"00000","msg":"success","data":{}}"#)
        .create_async()
        .await;
    let close_short = server
        .mock("POST", "/api/mix/v1/order/placeOrder")
        .match_body(Matcher::PartialJsonString(r#"{"side":"close_short","size":"0.06"}"#.to_string()))
        .with_body(r#"{"code":"00000","msg":"success","data":{"orderId":"1","clientOid":"a"}}"#)
        .create_async()
        .await;
    let open_long = server
        .mock("POST", "/api/mix/v1/order/placeOrder")
        .match_body(Matcher::PartialJsonString(r#"{"side":"open_long","size":"0.06"}"#.to_string()))
        .with_body(r#"{"code":"00000","msg":"success","data":{"orderId":"2","clientOid":"b"}}"#)
        .create_async()
        .await;

    let bot = TradingBot::new(
        BitgetClient::with_base_url(credentials(), server.url()),
        engine(&server),
        FearGreedClient::with_url(format!("{}/fng/", server.url())),
        news_store().await,
        settings(),
    );

    let report = assert_ok!(bot.run_tick(PositionState::Short).await);

    assert_eq!(report.decision.action, TradeAction::OpenLong);
    assert_eq!(report.position(), PositionState::Long);
    assert_eq!(report.execution.orders.len(), 2);

    decision.assert_async().await;
    leverage.assert_async().await;
    close_short.assert_async().await;
    open_long.assert_async().await;
}

#[tokio::test]
async fn test_dry_run_never_posts() {
    let mut server = mockito::Server::new_async().await;
    let _market = mock_market(&mut server).await;
    let _decision = mock_decision(&mut server, "open_short").await;

    let writes = server
        .mock("POST", Matcher::Regex(r"^/api/mix/v1/(order|account)/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let bot = TradingBot::new(
        DryRunExchange::new(BitgetClient::with_base_url(credentials(), server.url())),
        engine(&server),
        FearGreedClient::with_url(format!("{}/fng/", server.url())),
        news_store().await,
        settings(),
    );

    let report = assert_ok!(bot.run_tick(PositionState::Flat).await);
    assert_eq!(report.position(), PositionState::Short);
    assert!(report.execution.orders.iter().all(|o| o.succeeded()));

    writes.assert_async().await;
}

#[tokio::test]
async fn test_low_balance_blocks_orders() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/spot/v1/public/time")
        .with_body(format!(r#"{{"code":"00000","data":"{}"}}"#, SERVER_TIME_MS))
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/api/mix/v1/market/candles".to_string()))
        .with_body(candle_body())
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/api/mix/v1/account/accounts".to_string()))
        .with_body(r#"{"code":"00000","data":[{"marginCoin":"USDT","available":"9.99"}]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/fng/")
        .with_status(503)
        .create_async()
        .await;
    server
        .mock("POST", "/api/mix/v1/account/setLeverage")
        .with_body(r#"{"code":"00000","data":{}}"#)
        .create_async()
        .await;
    let _decision = mock_decision(&mut server, "open_short").await;
    let orders = server
        .mock("POST", "/api/mix/v1/order/placeOrder")
        .expect(0)
        .create_async()
        .await;

    let bot = TradingBot::new(
        BitgetClient::with_base_url(credentials(), server.url()),
        engine(&server),
        FearGreedClient::with_url(format!("{}/fng/", server.url())),
        news_store().await,
        settings(),
    );

    let report = assert_ok!(bot.run_tick(PositionState::Long).await);
    assert_eq!(report.position(), PositionState::Long);
    assert!(report.execution.orders.is_empty());

    orders.assert_async().await;
}

#[tokio::test]
async fn test_empty_candles_abort_tick() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/spot/v1/public/time")
        .with_body(format!(r#"{{"code":"00000","data":"{}"}}"#, SERVER_TIME_MS))
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/api/mix/v1/market/candles".to_string()))
        .with_body("[]")
        .create_async()
        .await;
    let decision = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let bot = TradingBot::new(
        BitgetClient::with_base_url(credentials(), server.url()),
        engine(&server),
        FearGreedClient::with_url(format!("{}/fng/", server.url())),
        news_store().await,
        settings(),
    );

    let err = assert_err!(bot.run_tick(PositionState::Flat).await);
    assert!(matches!(err, Error::Data(_)));
    decision.assert_async().await;
}

/// Clock whose sleep advances simulated time
#[derive(Clone)]
struct SimulatedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + TimeDelta::from_std(duration).unwrap());
    }
}

#[tokio::test]
async fn test_scheduled_session_carries_state_across_failures() {
    let mut server = mockito::Server::new_async().await;
    let _market = mock_market(&mut server).await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body(r#"{"error":{"message":"overloaded"}}"#)
        .create_async()
        .await;
    let orders = server
        .mock("POST", "/api/mix/v1/order/placeOrder")
        .expect(0)
        .create_async()
        .await;

    let bot = TradingBot::new(
        BitgetClient::with_base_url(credentials(), server.url()),
        engine(&server),
        FearGreedClient::with_url(format!("{}/fng/", server.url())),
        news_store().await,
        settings(),
    );

    let clock = SimulatedClock {
        now: Rc::new(Cell::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 58, 0).unwrap())),
    };
    let mut ticker = ClockTicker::new(clock.clone(), Schedule::quarter_hourly(), Duration::from_secs(1));
    let mut session = TradingSession::new(&bot, PositionState::Short);

    scheduler::run_slots(&mut ticker, &mut session, 2).await;

    assert_eq!(session.ticks(), 2);
    assert_eq!(session.failures(), 2);
    assert_eq!(session.position(), PositionState::Short);
    assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 6, 1, 10, 15, 0).unwrap());

    orders.assert_async().await;
}
