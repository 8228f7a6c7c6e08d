//! Replay command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;

use tickflow_config::AppConfig;
use tickflow_core::types::Tick;
use tickflow_data::{CsvTickSource, UtcSessionCalendar};
use tickflow_engine::{EngineConfig, TradingEngine};
use tickflow_gateway::PaperGateway;
use tickflow_monitor::ExitPrecedence;
use tickflow_risk::RiskBudget;
use tickflow_strategies::ValidatorRegistry;

use crate::cli::ReplayArgs;

pub async fn run(args: ReplayArgs, config_path: &Path) -> Result<()> {
    let config = load_or_default(config_path);

    let validator_key = args
        .validator
        .unwrap_or_else(|| config.validator.name.clone());
    let registry = ValidatorRegistry::new();
    let validator = registry
        .build(&validator_key, config.validator.config.clone())
        .with_context(|| format!("cannot build validator '{}'", validator_key))?;

    let calendar = if args.all_day {
        UtcSessionCalendar::all_day()
    } else {
        UtcSessionCalendar::new(
            config.session.open_time().map_err(anyhow::Error::msg)?,
            config.session.close_time().map_err(anyhow::Error::msg)?,
            config.session.entry_window_time().map_err(anyhow::Error::msg)?,
        )
    };

    let gateway = Arc::new(
        PaperGateway::new()
            .with_slippage(config.paper.slippage_pct)
            .with_latency(Duration::from_millis(config.paper.latency_ms)),
    );

    let engine_config = EngineConfig {
        ma_windows: config.engine.ma_windows.clone(),
        bar_archive: config.engine.bar_archive,
        queue_depth: config.engine.queue_depth,
        monitor_interval: Duration::from_millis(config.engine.monitor_interval_ms),
        ack_timeout: Duration::from_millis(config.engine.ack_timeout_ms),
        available_capital: config.risk.capital,
        risk_per_trade_fraction: config.risk.risk_per_trade_fraction(),
        exit_precedence: ExitPrecedence::StopFirst,
    };

    let engine = TradingEngine::new(
        engine_config,
        Arc::from(validator),
        gateway.clone(),
        Arc::new(calendar),
        RiskBudget::new(config.risk.daily_cap()),
    );

    let source = CsvTickSource::load(&args.data)
        .with_context(|| format!("cannot load ticks from {}", args.data.display()))?;
    info!(
        ticks = source.len(),
        validator = %validator_key,
        "starting replay"
    );

    let (tx, rx) = mpsc::channel::<Tick>(1024);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let feeder_gateway = gateway.clone();
    let feeder = tokio::spawn(async move {
        for tick in source.ticks().iter().cloned() {
            // The simulated gateway fills exits against the same feed the
            // engine consumes.
            if let Ok(price) = Decimal::try_from(tick.price) {
                feeder_gateway.update_price(&tick.instrument_id, price);
            }
            if tx.send(tick).await.is_err() {
                break;
            }
        }
    });

    let report = engine.run(rx, shutdown_rx).await;
    feeder.await.ok();

    println!("Replay complete");
    println!("  ticks processed:   {}", report.ticks_routed);
    println!("  instruments:       {}", report.instruments);
    println!("  open positions:    {}", report.snapshot.active.len());
    println!("  closed positions:  {}", report.snapshot.closed.len());
    println!(
        "  risk reserved:     {} / {}",
        report.snapshot.budget.used_today(),
        report.snapshot.budget.daily_cap()
    );
    let realized: Decimal = report.snapshot.closed.iter().map(|p| p.realized_pnl).sum();
    println!("  realized P&L:      {}", realized);
    println!("  simulated fills:   {}", gateway.fills().len());

    if let Some(path) = args.save {
        let json = serde_json::to_string_pretty(&report.snapshot)?;
        std::fs::write(&path, json)
            .with_context(|| format!("cannot write snapshot to {}", path.display()))?;
        println!("  snapshot saved to {}", path.display());
    }

    Ok(())
}

fn load_or_default(path: &Path) -> AppConfig {
    if path.exists() {
        match tickflow_config::load_config(path) {
            Ok(config) => return config,
            Err(err) => {
                tracing::warn!(%err, "failed to load config, using defaults");
            }
        }
    }
    AppConfig::default()
}
