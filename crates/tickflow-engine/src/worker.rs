//! Per-instrument processing pipeline.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use tickflow_core::traits::{EntryOrder, OrderAck, OrderGateway, SessionCalendar, SetupValidator};
use tickflow_core::types::{EvalSnapshot, Setup, Tick, Timeframe};
use tickflow_data::{AggregationScheduler, BarStore};
use tickflow_indicators::IndicatorEngine;
use tickflow_monitor::PriceBoard;
use tickflow_portfolio::PortfolioOrchestrator;
use tickflow_risk::{PositionSizer, SizingDecision};

/// One instrument's pipeline: aggregation → indicators → validation →
/// sizing → entry.
///
/// Each worker owns its bar and indicator state outright; instruments never
/// contend with each other. The only cross-instrument synchronization is
/// the orchestrator's transaction lock at commit time.
pub struct InstrumentWorker {
    instrument_id: String,
    scheduler: AggregationScheduler,
    indicators: IndicatorEngine,
    bars: BarStore,
    validator: Arc<dyn SetupValidator>,
    calendar: Arc<dyn SessionCalendar>,
    sizer: PositionSizer,
    orchestrator: Arc<PortfolioOrchestrator>,
    gateway: Arc<dyn OrderGateway>,
    prices: Arc<PriceBoard>,
    available_capital: Decimal,
    ack_timeout: Duration,
}

impl InstrumentWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument_id: String,
        ma_windows: &[usize],
        bar_archive: usize,
        validator: Arc<dyn SetupValidator>,
        calendar: Arc<dyn SessionCalendar>,
        sizer: PositionSizer,
        orchestrator: Arc<PortfolioOrchestrator>,
        gateway: Arc<dyn OrderGateway>,
        prices: Arc<PriceBoard>,
        available_capital: Decimal,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            instrument_id,
            scheduler: AggregationScheduler::new(calendar.clone()),
            indicators: IndicatorEngine::new(ma_windows),
            bars: BarStore::new(bar_archive),
            validator,
            calendar,
            sizer,
            orchestrator,
            gateway,
            prices,
            available_capital,
            ack_timeout,
        }
    }

    /// Process one tick end to end.
    pub async fn handle_tick(&mut self, tick: Tick) {
        let closed = match self.scheduler.on_tick(&tick) {
            Ok(closed) => closed,
            Err(err) => {
                // Dropped, logged, processing continues.
                warn!(instrument = %self.instrument_id, %err, "tick dropped");
                return;
            }
        };
        for bar in closed {
            self.indicators.on_bar_closed(&bar);
            self.bars.push(bar);
        }

        if let Ok(price) = Decimal::try_from(tick.price) {
            self.prices.update(&self.instrument_id, price);
        }

        let now = tick.datetime();
        if !self.calendar.in_entry_window(now) {
            return;
        }
        // Warm-up short-circuit: the validator would only see Warmup values.
        let daily_bars = self
            .indicators
            .current_state(&self.instrument_id, Timeframe::Daily)
            .map_or(0, |s| s.bars_seen);
        if daily_bars < self.validator.required_bars() {
            return;
        }
        // The orchestrator re-checks under its lock; this avoids pointless
        // evaluation while a position is live.
        if self.orchestrator.active_position(&self.instrument_id).is_some() {
            return;
        }

        let snapshot = self.snapshot(&tick, now);
        match self.validator.evaluate(&snapshot, now) {
            Ok(Some(setup)) => self.try_enter(setup).await,
            Ok(None) => {}
            Err(err) => {
                // Isolated: this instrument's cycle is skipped, others are
                // unaffected.
                warn!(
                    instrument = %self.instrument_id,
                    validator = self.validator.name(),
                    %err,
                    "validator failed, cycle skipped"
                );
            }
        }
    }

    /// Frozen view of this instrument's state for one evaluation.
    fn snapshot(&self, tick: &Tick, now: DateTime<Utc>) -> EvalSnapshot {
        EvalSnapshot {
            instrument_id: self.instrument_id.clone(),
            evaluated_at: now,
            last_price: tick.price,
            session_bar: self.scheduler.in_progress_daily(&self.instrument_id).cloned(),
            timeframes: self.indicators.instrument_state(&self.instrument_id),
        }
    }

    /// Size the setup and, if accepted, commit the entry and submit the
    /// order.
    async fn try_enter(&self, setup: Setup) {
        let budget = self.orchestrator.budget();
        let decision = self.sizer.size(&setup, &budget, self.available_capital);
        let (quantity, risk_reserved) = match decision {
            SizingDecision::Accepted {
                quantity,
                risk_reserved,
            } => (quantity, risk_reserved),
            SizingDecision::Rejected { reason } => {
                debug!(instrument = %self.instrument_id, %reason, "setup rejected by sizer");
                return;
            }
        };

        let position = match self.orchestrator.request_entry(&setup, quantity, risk_reserved) {
            Ok(position) => position,
            Err(err) => {
                debug!(instrument = %self.instrument_id, %err, "entry not committed");
                return;
            }
        };

        let order = EntryOrder {
            position_id: position.id,
            instrument_id: setup.instrument_id.clone(),
            direction: setup.direction,
            quantity,
            reference_price: setup.reference_price,
            stop: setup.proposed_stop,
            target: setup.proposed_target,
        };

        let ack = tokio::time::timeout(self.ack_timeout, self.gateway.submit_entry(&order)).await;
        let outcome = match ack {
            Ok(Ok(OrderAck::Accepted { fill_price })) => {
                self.orchestrator.confirm_entry(position.id, fill_price)
            }
            Ok(Ok(OrderAck::Rejected { reason })) => {
                warn!(position = %position.id, %reason, "entry rejected by gateway");
                self.orchestrator.fail_entry(position.id)
            }
            Ok(Err(err)) => {
                warn!(position = %position.id, %err, "entry submission failed");
                self.orchestrator.fail_entry(position.id)
            }
            Err(_) => {
                warn!(
                    position = %position.id,
                    timeout_ms = self.ack_timeout.as_millis() as u64,
                    "entry acknowledgment timed out"
                );
                self.orchestrator.fail_entry(position.id)
            }
        };
        if let Err(err) = outcome {
            warn!(position = %position.id, %err, "entry transition failed");
        }
    }

    /// Instrument this worker serves.
    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    /// Closed-bar archive, for end-of-run inspection.
    pub fn bars(&self) -> &BarStore {
        &self.bars
    }
}
