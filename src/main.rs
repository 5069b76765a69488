use anyhow::{Context, Result};
use clap::Parser;
use coin_trader::api::FearGreedClient;
use coin_trader::config::{AppConfig, Secrets};
use coin_trader::decision::{system_prompt, OpenAIDecisionEngine};
use coin_trader::exchange::{BitgetClient, BitgetCredentials, DryRunExchange, Exchange};
use coin_trader::news::SqliteNewsStore;
use coin_trader::scheduler::{self, ClockTicker, SystemClock};
use coin_trader::{PositionState, TradingBot, TradingSession};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coin-trader")]
#[command(about = "LLM-driven futures trading bot", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./coin-trader.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Run a single tick immediately and exit
    #[arg(long)]
    once: bool,

    /// Log leverage changes and orders instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    setup_logging(&cfg.logging.filter);

    tracing::info!("🚀 Coin trader starting");

    let secrets = Secrets::from_env().context("missing credentials")?;

    let exchange = BitgetClient::with_base_url(
        BitgetCredentials {
            api_key: secrets.bitget_api_key.clone(),
            api_secret: secrets.bitget_api_secret.clone(),
            passphrase: secrets.bitget_passphrase.clone(),
        },
        cfg.exchange.base_url.clone(),
    );

    if cli.dry_run {
        tracing::info!("🧪 Dry run: orders are logged, not sent");
        run(DryRunExchange::new(exchange), &cfg, &secrets, cli.once).await
    } else {
        run(exchange, &cfg, &secrets, cli.once).await
    }
}

async fn run<E: Exchange>(exchange: E, cfg: &AppConfig, secrets: &Secrets, once: bool) -> Result<()> {
    let settings = cfg.bot_settings().context("invalid trading settings")?;
    let schedule = cfg.schedule().context("invalid schedule")?;

    let prompt = system_prompt(
        &cfg.decision.asset_name,
        settings.trade.leverage,
        schedule.cadence_minutes(),
        &cfg.decision.reason_language,
    );
    let engine = OpenAIDecisionEngine::new(secrets.openai_api_key.clone(), prompt)
        .with_api_url(cfg.decision.api_url.clone())
        .with_model(cfg.decision.model.clone())
        .with_timeout(cfg.decision_timeout());

    let sentiment = FearGreedClient::with_url(cfg.sentiment.url.clone());
    let news = SqliteNewsStore::connect_lazy(&cfg.news.database_url)
        .with_context(|| format!("invalid news database url {}", cfg.news.database_url))?;

    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {}", settings.trade.symbol);
    tracing::info!("  Leverage: {}x", settings.trade.leverage);
    tracing::info!("  Trade size: {}", settings.trade.trade_size);
    tracing::info!("  Min balance: {:.2} {}", settings.trade.min_balance, settings.trade.margin_coin);
    tracing::info!("  Schedule: minutes {:?}", schedule.minute_offsets());

    let bot = TradingBot::new(exchange, engine, sentiment, news, settings);

    if once {
        let report = bot.run_tick(PositionState::Flat).await?;
        tracing::info!("✅ Tick complete, position: {}", report.position());
        return Ok(());
    }

    let mut ticker = ClockTicker::new(SystemClock, schedule, cfg.poll_interval());
    if let Some(next) = ticker.next_run() {
        tracing::info!("⏰ First tick at {}", next.format("%H:%M:%S"));
    }

    let mut session = TradingSession::new(&bot, PositionState::Flat);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
        }
        _ = scheduler::run_forever(&mut ticker, &mut session) => {}
    }

    tracing::info!(
        "👋 Stopped after {} ticks ({} failed)",
        session.ticks(),
        session.failures()
    );

    Ok(())
}

fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
