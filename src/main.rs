use anyhow::Context;
use autotrader::execution::ExecutionMode;
use autotrader::models::{Decision, TradingDecision};
use autotrader::scheduler::Scheduler;
use autotrader::strategy::StrategyKind;
use autotrader::{AppConfig, AppContext, TradingError};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

/// Single-pair signal-to-execution trading loop
#[derive(Parser, Debug)]
#[command(name = "autotrader", version, about)]
struct Cli {
    /// Config file (TOML); defaults to config/autotrader.toml if present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force simulation mode
    #[arg(long, conflicts_with = "live")]
    simulate: bool,

    /// Force live mode (needs BINANCE_API_KEY / BINANCE_SECRET_KEY)
    #[arg(long)]
    live: bool,

    /// Override the configured strategy
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// External advisory decision merged with the strategy signal
    #[arg(long, default_value = "hold")]
    advisory: Decision,

    /// Run one trading cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.live {
        config.execution.mode = ExecutionMode::Live;
    } else if cli.simulate {
        config.execution.mode = ExecutionMode::Simulation;
    }
    if let Some(kind) = cli.strategy {
        config.strategy.kind = kind;
    }
    config.validate()?;

    tracing::info!("🚀 Autotrader starting");
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Pair: {} ({})", config.exchange.symbol, config.exchange.interval);
    tracing::info!(
        "  Order: {} x{}",
        config.execution.order_quantity,
        config.execution.leverage
    );
    tracing::info!("  Advisory: {}", cli.advisory);

    let scheduler_config = config.scheduler.clone();
    let ctx = Arc::new(
        AppContext::from_config(config)
            .await
            .context("initializing services")?,
    );

    let pipeline = &ctx.pipeline;
    tracing::info!("  Mode: {:?}", pipeline.executor().mode());
    tracing::info!(
        "  Strategy: {} (needs {} candles)",
        pipeline.strategy().name(),
        pipeline.strategy().min_candles_required()
    );
    tracing::info!(
        "  Rate limit: {} requests / {}ms",
        ctx.rate_limiter.capacity(),
        ctx.rate_limiter.window().as_millis()
    );

    let external = TradingDecision::new(
        "operator",
        cli.advisory,
        1.0,
        "advisory supplied on the command line",
    );

    if cli.once {
        run_trading_cycle(&ctx, external).await;
        return Ok(());
    }

    tracing::info!("\n🔄 Spawning independent loops...");
    let mut scheduler = Scheduler::new();

    // Loop 1: market data refresh
    {
        let ctx = ctx.clone();
        scheduler.spawn(
            "market-data",
            Duration::from_secs(scheduler_config.refresh_interval_secs),
            move || {
                let ctx = ctx.clone();
                async move {
                    if let Err(e) = ctx.pipeline.refresh_history().await {
                        tracing::error!("✗ History refresh failed: {}", e);
                    }
                }
            },
        );
    }

    // Loop 2: health check
    {
        let ctx = ctx.clone();
        scheduler.spawn(
            "health",
            Duration::from_secs(scheduler_config.health_interval_secs),
            move || {
                let ctx = ctx.clone();
                async move {
                    let report = ctx.health_check().await;
                    let status = report.rate_limit;
                    if report.exchange_ready {
                        tracing::info!(
                            used = status.used,
                            capacity = status.capacity,
                            remaining_ms = status.remaining.as_millis() as u64,
                            "🩺 Healthy"
                        );
                    } else {
                        tracing::warn!(
                            used = status.used,
                            capacity = status.capacity,
                            "🩺 Exchange not reachable, orders will fail"
                        );
                    }
                }
            },
        );
    }

    // Loop 3: trading
    {
        let ctx = ctx.clone();
        scheduler.spawn(
            "trading",
            Duration::from_secs(scheduler_config.trading_interval_secs),
            move || {
                let ctx = ctx.clone();
                let external = external.clone();
                async move { run_trading_cycle(&ctx, external).await }
            },
        );
    }

    tracing::info!("✅ All loops spawned successfully");
    tracing::info!("\nPress Ctrl+C to stop...\n");

    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;
    tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");

    let unclean = scheduler
        .shutdown(Duration::from_secs(scheduler_config.shutdown_timeout_secs))
        .await;
    if unclean > 0 {
        tracing::warn!("{} loop(s) aborted or ended abnormally", unclean);
    }

    tracing::info!("👋 Autotrader stopped");
    Ok(())
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autotrader=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_trading_cycle(ctx: &AppContext, external: TradingDecision) {
    match ctx.pipeline.run_cycle(external).await {
        Ok(outcome) => {
            let Some(order) = outcome.order else {
                return;
            };
            tracing::info!(
                order_id = %order.id,
                status = ?order.status(),
                decision = %outcome.decision.decision(),
                source = outcome.decision.source(),
                price = ?order.executed_price(),
                cost = ?order.total_cost(),
                simulated = order.simulated,
                "💹 Cycle complete"
            );
        }
        Err(TradingError::Execution { order, source }) => {
            tracing::error!(
                order_id = %order.id,
                symbol = %order.symbol,
                "✗ Order failed: {}",
                source
            );
        }
        Err(e) => {
            tracing::warn!("✗ Trading cycle skipped: {}", e);
        }
    }
}
