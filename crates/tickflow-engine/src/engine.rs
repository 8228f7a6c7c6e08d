//! The coordinating event loop.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use tickflow_core::traits::{OrderGateway, SessionCalendar, SetupValidator};
use tickflow_core::types::Tick;
use tickflow_monitor::{ExitMonitor, ExitPrecedence, PriceBoard};
use tickflow_portfolio::{PortfolioOrchestrator, PortfolioSnapshot};
use tickflow_risk::{PositionSizer, RiskBudget};

use crate::worker::InstrumentWorker;

/// Engine tuning knobs, mapped from configuration by the caller.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Moving-average windows computed per timeframe
    pub ma_windows: Vec<usize>,
    /// Closed bars archived per (instrument, timeframe)
    pub bar_archive: usize,
    /// Bounded tick queue depth per instrument worker
    pub queue_depth: usize,
    /// Exit monitor cadence
    pub monitor_interval: Duration,
    /// Order acknowledgment timeout
    pub ack_timeout: Duration,
    /// Capital available to any single entry
    pub available_capital: Decimal,
    /// Per-trade fraction of the daily risk cap
    pub risk_per_trade_fraction: Decimal,
    /// Stop/target tiebreak policy
    pub exit_precedence: ExitPrecedence,
}

/// Outcome of one engine run.
#[derive(Debug)]
pub struct EngineReport {
    /// Ticks accepted from the source
    pub ticks_routed: u64,
    /// Instruments that produced at least one tick
    pub instruments: usize,
    /// Final book state for the persistence collaborator
    pub snapshot: PortfolioSnapshot,
}

/// The event loop.
///
/// Fans ticks out to per-instrument worker tasks over bounded queues;
/// workers update bar/indicator state independently and serialize only on
/// the orchestrator's commit lock. The exit monitor runs on its own cadence
/// against the same orchestrator.
pub struct TradingEngine {
    config: EngineConfig,
    validator: Arc<dyn SetupValidator>,
    gateway: Arc<dyn OrderGateway>,
    calendar: Arc<dyn SessionCalendar>,
    orchestrator: Arc<PortfolioOrchestrator>,
    prices: Arc<PriceBoard>,
}

impl TradingEngine {
    /// Assemble an engine around a fresh book.
    pub fn new(
        config: EngineConfig,
        validator: Arc<dyn SetupValidator>,
        gateway: Arc<dyn OrderGateway>,
        calendar: Arc<dyn SessionCalendar>,
        budget: RiskBudget,
    ) -> Self {
        Self {
            config,
            validator,
            gateway,
            calendar,
            orchestrator: Arc::new(PortfolioOrchestrator::new(budget)),
            prices: Arc::new(PriceBoard::new()),
        }
    }

    /// The single authority over positions and risk.
    pub fn orchestrator(&self) -> Arc<PortfolioOrchestrator> {
        self.orchestrator.clone()
    }

    /// The shared last-price board.
    pub fn prices(&self) -> Arc<PriceBoard> {
        self.prices.clone()
    }

    /// Restore the book from a snapshot before running.
    pub fn restore(&self, snapshot: PortfolioSnapshot) {
        self.orchestrator.restore(snapshot);
    }

    /// Run until the tick source closes or shutdown is signalled.
    ///
    /// Shutdown is orderly: tick intake stops first, in-flight worker
    /// pipelines drain, the exit monitor finishes a final sweep, and the
    /// closing snapshot is returned for persistence.
    pub async fn run(
        &self,
        mut ticks: mpsc::Receiver<Tick>,
        mut shutdown: watch::Receiver<bool>,
    ) -> EngineReport {
        // Internal shutdown relay: also fires when the source runs dry, so
        // the monitor task always sees a stop signal.
        let (stop_tx, stop_rx) = watch::channel(false);

        let monitor = Arc::new(ExitMonitor::new(
            self.orchestrator.clone(),
            self.gateway.clone(),
            self.prices.clone(),
            self.config.exit_precedence,
            self.config.ack_timeout,
        ));
        let monitor_handle = tokio::spawn(
            monitor.run(self.config.monitor_interval, stop_rx),
        );

        let mut queues: HashMap<String, mpsc::Sender<Tick>> = HashMap::new();
        let mut workers: Vec<(String, JoinHandle<()>)> = Vec::new();
        let mut ticks_routed = 0u64;
        let mut shutdown_alive = true;

        loop {
            tokio::select! {
                maybe_tick = ticks.recv() => {
                    let Some(tick) = maybe_tick else {
                        info!("tick source exhausted");
                        break;
                    };
                    ticks_routed += 1;
                    let queue = match queues.entry(tick.instrument_id.clone()) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            let (queue, handle) = self.spawn_worker(tick.instrument_id.clone());
                            workers.push((tick.instrument_id.clone(), handle));
                            entry.insert(queue)
                        }
                    };
                    // Bounded queue: a slow instrument back-pressures its
                    // own lane without stalling the others' state.
                    if queue.send(tick).await.is_err() {
                        warn!("worker queue closed unexpectedly");
                    }
                }
                changed = shutdown.changed(), if shutdown_alive => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => {
                            info!("shutdown requested, stopping tick intake");
                            break;
                        }
                        Ok(()) => {}
                        // Controller gone; keep running until the source ends.
                        Err(_) => shutdown_alive = false,
                    }
                }
            }
        }

        // Drain workers: closing the queues lets each finish its backlog.
        let instruments = queues.len();
        drop(queues);
        for (instrument, handle) in workers {
            if let Err(err) = handle.await {
                warn!(%instrument, %err, "worker terminated abnormally");
            }
        }

        // Let the exit monitor finish its final pass.
        let _ = stop_tx.send(true);
        if let Err(err) = monitor_handle.await {
            warn!(%err, "exit monitor terminated abnormally");
        }

        let snapshot = self.orchestrator.snapshot();
        info!(
            ticks = ticks_routed,
            instruments,
            open = snapshot.active.len(),
            closed = snapshot.closed.len(),
            "engine stopped"
        );
        EngineReport {
            ticks_routed,
            instruments,
            snapshot,
        }
    }

    fn spawn_worker(&self, instrument_id: String) -> (mpsc::Sender<Tick>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Tick>(self.config.queue_depth);
        let mut worker = InstrumentWorker::new(
            instrument_id,
            &self.config.ma_windows,
            self.config.bar_archive,
            self.validator.clone(),
            self.calendar.clone(),
            PositionSizer::new(self.config.risk_per_trade_fraction),
            self.orchestrator.clone(),
            self.gateway.clone(),
            self.prices.clone(),
            self.config.available_capital,
            self.config.ack_timeout,
        );

        let handle = tokio::spawn(async move {
            while let Some(tick) = rx.recv().await {
                worker.handle_tick(tick).await;
            }
        });
        (tx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tickflow_core::error::ValidatorError;
    use tickflow_core::types::{Direction, EvalSnapshot, Setup};
    use tickflow_data::UtcSessionCalendar;
    use tickflow_gateway::PaperGateway;

    /// Goes long whenever the 3-bar daily average is warmed up and price
    /// sits above it.
    struct TestValidator;

    impl SetupValidator for TestValidator {
        fn name(&self) -> &str {
            "test_above_ma"
        }

        fn evaluate(
            &self,
            snapshot: &EvalSnapshot,
            now: DateTime<Utc>,
        ) -> Result<Option<Setup>, ValidatorError> {
            let Some(ma) = snapshot.daily_ma(3) else {
                return Ok(None);
            };
            if snapshot.last_price <= ma {
                return Ok(None);
            }
            let reference = Decimal::try_from(snapshot.last_price)
                .map_err(|e| ValidatorError::Evaluation(e.to_string()))?;
            Ok(Some(Setup {
                instrument_id: snapshot.instrument_id.clone(),
                timestamp: now,
                direction: Direction::Long,
                reference_price: reference,
                proposed_stop: reference * dec!(0.98),
                proposed_target: reference * dec!(1.04),
                validator: "test_above_ma".to_string(),
            }))
        }

        fn required_bars(&self) -> usize {
            3
        }
    }

    /// Fails on one instrument, to prove isolation.
    struct FaultyOnA;

    impl SetupValidator for FaultyOnA {
        fn name(&self) -> &str {
            "faulty_on_a"
        }

        fn evaluate(
            &self,
            snapshot: &EvalSnapshot,
            now: DateTime<Utc>,
        ) -> Result<Option<Setup>, ValidatorError> {
            if snapshot.instrument_id == "AAA" {
                return Err(ValidatorError::Evaluation("deliberate".to_string()));
            }
            TestValidator.evaluate(snapshot, now)
        }

        fn required_bars(&self) -> usize {
            3
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            ma_windows: vec![3],
            bar_archive: 100,
            queue_depth: 64,
            monitor_interval: Duration::from_millis(10),
            ack_timeout: Duration::from_millis(200),
            available_capital: dec!(100000),
            risk_per_trade_fraction: dec!(0.01),
            exit_precedence: ExitPrecedence::StopFirst,
        }
    }

    fn millis(day: u32, hour: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    /// Four rising weekdays of ticks: enough to warm a 3-bar average and
    /// put price above it on day four.
    fn warmup_ticks(instrument: &str, base: f64) -> Vec<Tick> {
        let mut ticks = Vec::new();
        let mut seq = 0;
        for (i, day) in [11u32, 12, 13, 14].iter().enumerate() {
            seq += 1;
            ticks.push(Tick::new(
                instrument,
                base + i as f64,
                50_000.0,
                millis(*day, 10),
                seq,
            ));
        }
        ticks
    }

    async fn run_engine(
        engine: &TradingEngine,
        ticks: Vec<Tick>,
        paper: Option<Arc<PaperGateway>>,
    ) -> EngineReport {
        let (tx, rx) = mpsc::channel(64);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let feeder = async move {
            for tick in ticks {
                if let Some(paper) = &paper {
                    if let Ok(price) = Decimal::try_from(tick.price) {
                        paper.update_price(&tick.instrument_id, price);
                    }
                }
                tx.send(tick).await.unwrap();
            }
        };

        let (report, _) = tokio::join!(engine.run(rx, shutdown_rx), feeder);
        report
    }

    #[tokio::test]
    async fn test_entry_flow_end_to_end() {
        let paper = Arc::new(PaperGateway::new().with_slippage(Decimal::ZERO));
        let engine = TradingEngine::new(
            config(),
            Arc::new(TestValidator),
            paper.clone(),
            Arc::new(UtcSessionCalendar::all_day()),
            RiskBudget::new(dec!(1000)),
        );

        // Day four's tick (103) is above the 100/101/102 average; a single
        // long entry opens and survives to the final snapshot.
        let report = run_engine(&engine, warmup_ticks("RELIANCE", 100.0), Some(paper)).await;

        assert_eq!(report.ticks_routed, 4);
        assert_eq!(report.instruments, 1);
        assert_eq!(report.snapshot.active.len(), 1);

        let position = &report.snapshot.active[0];
        assert_eq!(position.instrument_id, "RELIANCE");
        assert_eq!(position.entry_price, dec!(103));
        assert!(position.risk_reserved > Decimal::ZERO);
        assert!(report.snapshot.budget.used_today() >= position.risk_reserved);
    }

    #[tokio::test]
    async fn test_stop_exit_via_monitor() {
        let paper = Arc::new(PaperGateway::new().with_slippage(Decimal::ZERO));
        let engine = TradingEngine::new(
            config(),
            Arc::new(TestValidator),
            paper.clone(),
            Arc::new(UtcSessionCalendar::all_day()),
            RiskBudget::new(dec!(1000)),
        );

        // After the entry at 103, a tick crashes through the 2% stop. The
        // monitor's final sweep must close the position exactly once.
        let mut ticks = warmup_ticks("RELIANCE", 100.0);
        ticks.push(Tick::new("RELIANCE", 95.0, 1_000.0, millis(14, 11), 5));
        ticks.push(Tick::new("RELIANCE", 94.0, 1_000.0, millis(14, 12), 6));

        let report = run_engine(&engine, ticks, Some(paper)).await;

        assert!(report.snapshot.active.is_empty());
        assert_eq!(report.snapshot.closed.len(), 1);
        let closed = &report.snapshot.closed[0];
        assert_eq!(closed.exit_reason, Some(tickflow_core::types::ExitReason::StopHit));
        assert_eq!(report.snapshot.budget.used_today(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_faulty_validator_is_isolated() {
        let paper = Arc::new(PaperGateway::new().with_slippage(Decimal::ZERO));
        let engine = TradingEngine::new(
            config(),
            Arc::new(FaultyOnA),
            paper.clone(),
            Arc::new(UtcSessionCalendar::all_day()),
            RiskBudget::new(dec!(1000)),
        );

        // AAA's validator always fails; BBB must still trade.
        let mut ticks = Vec::new();
        for (a, b) in warmup_ticks("AAA", 100.0)
            .into_iter()
            .zip(warmup_ticks("BBB", 200.0))
        {
            ticks.push(a);
            ticks.push(b);
        }

        let report = run_engine(&engine, ticks, Some(paper)).await;

        assert_eq!(report.instruments, 2);
        assert_eq!(report.snapshot.active.len(), 1);
        assert_eq!(report.snapshot.active[0].instrument_id, "BBB");
    }

    #[tokio::test]
    async fn test_risk_cap_bounds_concurrent_entries() {
        // Cap fits only two reservations; with five instruments all
        // signalling, the invariant must hold in the final snapshot.
        let paper = Arc::new(PaperGateway::new().with_slippage(Decimal::ZERO));
        let mut cfg = config();
        cfg.risk_per_trade_fraction = dec!(0.5);
        let engine = TradingEngine::new(
            cfg,
            Arc::new(TestValidator),
            paper.clone(),
            Arc::new(UtcSessionCalendar::all_day()),
            RiskBudget::new(dec!(20)),
        );

        let mut ticks = Vec::new();
        for name in ["AA", "BB", "CC", "DD", "EE"] {
            ticks.extend(warmup_ticks(name, 100.0));
        }

        let report = run_engine(&engine, ticks, Some(paper)).await;

        let reserved: Decimal = report
            .snapshot
            .active
            .iter()
            .filter(|p| p.status.holds_risk())
            .map(|p| p.risk_reserved)
            .sum();
        assert!(reserved <= dec!(20));
        assert!(report.snapshot.budget.used_today() <= dec!(20));
        assert!(!report.snapshot.active.is_empty());
    }
}
