// One trading tick: fetch, aggregate, decide, execute
use chrono::{DateTime, Utc};

use crate::api::SentimentSource;
use crate::context::{DecisionContext, TimeframeTable};
use crate::decision::DecisionEngine;
use crate::exchange::Exchange;
use crate::execution::{ExecutionReport, Executor, TradeSettings};
use crate::market_data::{fetch_account_snapshot, fetch_candles, Granularity};
use crate::models::{Decision, NewsHeadline, PositionState};
use crate::news::NewsSource;
use crate::scheduler::ScheduledJob;
use crate::Result;

/// Static parameters of the trading pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub product_type: String,
    /// Timeframes sent to the decision engine, primary first
    pub timeframes: Vec<Granularity>,
    pub candle_count: u32,
    pub news_asset_tag: String,
    pub news_limit: u32,
    pub trade: TradeSettings,
}

/// Outcome of a completed tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub decision: Decision,
    pub execution: ExecutionReport,
}

impl TickReport {
    pub fn position(&self) -> PositionState {
        self.execution.position
    }
}

/// The whole bot: data sources, decision engine and exchange
pub struct TradingBot<E, D, S, N> {
    exchange: E,
    engine: D,
    sentiment: S,
    news: N,
    settings: BotSettings,
}

impl<E, D, S, N> TradingBot<E, D, S, N>
where
    E: Exchange,
    D: DecisionEngine,
    S: SentimentSource,
    N: NewsSource,
{
    pub fn new(exchange: E, engine: D, sentiment: S, news: N, settings: BotSettings) -> Self {
        Self {
            exchange,
            engine,
            sentiment,
            news,
            settings,
        }
    }

    /// Run the pipeline once from `prior` and return the new position state
    ///
    /// Errors before execution (candles, account, decision) abort the tick
    /// with no order sent. Once execution starts the tick always completes.
    pub async fn run_tick(&self, prior: PositionState) -> Result<TickReport> {
        let symbol = &self.settings.trade.symbol;

        let mut timeframes = Vec::with_capacity(self.settings.timeframes.len());
        for granularity in &self.settings.timeframes {
            let rows = fetch_candles(
                &self.exchange,
                symbol,
                granularity.as_str(),
                self.settings.candle_count,
            )
            .await?;
            tracing::info!("  📈 {} {} candles loaded", rows.len(), granularity);
            timeframes.push(TimeframeTable {
                granularity: *granularity,
                rows,
            });
        }

        let fear_greed = self.sentiment.current_reading().await;
        if let Some(reading) = &fear_greed {
            tracing::info!(
                "  😨 Fear & Greed: {} ({})",
                reading.value,
                reading.value_classification
            );
        }

        let news = self.latest_news().await;

        let account = fetch_account_snapshot(
            &self.exchange,
            &self.settings.product_type,
            &self.settings.trade.margin_coin,
        )
        .await?;
        tracing::info!(
            "  💰 Available balance: {:.2} {}",
            account.available,
            self.settings.trade.margin_coin
        );

        let context = DecisionContext {
            account,
            timeframes,
            fear_greed,
            news,
        };
        let payload = context.to_payload()?;

        let decision = self.engine.decide(&payload).await?;
        tracing::info!("  🤖 AI decision: {}", decision.action);
        tracing::info!("  📝 Reason: {}", decision.reason);

        let execution = Executor::new(&self.exchange, &self.settings.trade)
            .execute(&decision, prior, context.account.available)
            .await;
        tracing::info!("  📍 Position: {} → {}", prior, execution.position);

        Ok(TickReport {
            decision,
            execution,
        })
    }

    async fn latest_news(&self) -> Vec<NewsHeadline> {
        match self
            .news
            .latest_headlines(&self.settings.news_asset_tag, self.settings.news_limit)
            .await
        {
            Ok(headlines) => headlines,
            Err(e) => {
                tracing::warn!("  ⚠️  News unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

/// Scheduled runner that carries the position state from tick to tick
///
/// A failed tick is logged and leaves the state untouched.
pub struct TradingSession<'a, E, D, S, N> {
    bot: &'a TradingBot<E, D, S, N>,
    position: PositionState,
    ticks: u64,
    failures: u64,
}

impl<'a, E, D, S, N> TradingSession<'a, E, D, S, N>
where
    E: Exchange,
    D: DecisionEngine,
    S: SentimentSource,
    N: NewsSource,
{
    pub fn new(bot: &'a TradingBot<E, D, S, N>, position: PositionState) -> Self {
        Self {
            bot,
            position,
            ticks: 0,
            failures: 0,
        }
    }

    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl<E, D, S, N> ScheduledJob for TradingSession<'_, E, D, S, N>
where
    E: Exchange,
    D: DecisionEngine,
    S: SentimentSource,
    N: NewsSource,
{
    async fn run(&mut self, slot: DateTime<Utc>) {
        self.ticks += 1;
        tracing::info!(
            "🔄 [TRADING] Tick #{} at {}",
            self.ticks,
            slot.format("%H:%M:%S")
        );

        match self.bot.run_tick(self.position).await {
            Ok(report) => self.position = report.position(),
            Err(e) => {
                self.failures += 1;
                tracing::error!("  ✗ Tick aborted: {}", e);
            }
        }
    }
}
