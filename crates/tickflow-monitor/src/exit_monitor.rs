//! Stop/target monitoring of open positions.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use tickflow_core::traits::{ExitOrder, OrderAck, OrderGateway};
use tickflow_core::types::{Direction, ExitReason, Position};
use tickflow_portfolio::PortfolioOrchestrator;

use crate::prices::PriceBoard;

/// Which level wins when a gap touches stop and target in the same sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExitPrecedence {
    /// Assume the worse fill: the stop (conservative default)
    #[default]
    StopFirst,
    /// Assume the target filled first
    TargetFirst,
}

/// Recurring watcher over open positions.
///
/// Runs on its own cadence, independent of tick arrival. Each sweep
/// compares the last known price of every Open position against its stop
/// and target; a touch requests exactly one exit through the orchestrator.
/// The Exiting state guards against a second request while the first is in
/// flight.
pub struct ExitMonitor {
    orchestrator: Arc<PortfolioOrchestrator>,
    gateway: Arc<dyn OrderGateway>,
    prices: Arc<PriceBoard>,
    precedence: ExitPrecedence,
    ack_timeout: Duration,
}

impl ExitMonitor {
    /// Create a monitor over the given book and price board.
    pub fn new(
        orchestrator: Arc<PortfolioOrchestrator>,
        gateway: Arc<dyn OrderGateway>,
        prices: Arc<PriceBoard>,
        precedence: ExitPrecedence,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            gateway,
            prices,
            precedence,
            ack_timeout,
        }
    }

    /// Decide whether `price` triggers an exit for `position`.
    pub fn decide(position: &Position, price: Decimal, precedence: ExitPrecedence) -> Option<ExitReason> {
        let (stop_touched, target_touched) = match position.direction {
            Direction::Long => (price <= position.stop, price >= position.target),
            Direction::Short => (price >= position.stop, price <= position.target),
        };

        match (stop_touched, target_touched) {
            (true, true) => Some(match precedence {
                ExitPrecedence::StopFirst => ExitReason::StopHit,
                ExitPrecedence::TargetFirst => ExitReason::TargetHit,
            }),
            (true, false) => Some(ExitReason::StopHit),
            (false, true) => Some(ExitReason::TargetHit),
            (false, false) => None,
        }
    }

    /// One pass over all Open positions. Returns the number of exits this
    /// sweep initiated.
    pub async fn sweep(&self) -> usize {
        let mut initiated = 0;

        for position in self.orchestrator.open_positions() {
            let Some(price) = self.prices.get(&position.instrument_id) else {
                continue;
            };
            let Some(reason) = Self::decide(&position, price, self.precedence) else {
                continue;
            };

            // A concurrent confirmation may have closed the position since
            // open_positions() was taken; both outcomes are fine.
            match self.orchestrator.request_exit(position.id, reason) {
                Ok(true) => {
                    initiated += 1;
                    self.submit_exit(&position, reason, price).await;
                }
                Ok(false) => {}
                Err(err) => debug!(position = %position.id, %err, "exit request skipped"),
            }
        }

        initiated
    }

    /// Submit the exit order and confirm the transition.
    ///
    /// A rejected or timed-out acknowledgment finalizes the position at the
    /// last known price: leaving it Exiting forever would pin its risk
    /// reservation for the rest of the session.
    async fn submit_exit(&self, position: &Position, reason: ExitReason, mark_price: Decimal) {
        let order = ExitOrder {
            position_id: position.id,
            instrument_id: position.instrument_id.clone(),
            direction: position.direction,
            quantity: position.quantity,
            reason,
        };

        let ack = tokio::time::timeout(self.ack_timeout, self.gateway.submit_exit(&order)).await;
        let exit_price = match ack {
            Ok(Ok(OrderAck::Accepted { fill_price })) => fill_price,
            Ok(Ok(OrderAck::Rejected { reason })) => {
                warn!(position = %position.id, %reason, "exit rejected, closing at mark");
                mark_price
            }
            Ok(Err(err)) => {
                warn!(position = %position.id, %err, "exit submission failed, closing at mark");
                mark_price
            }
            Err(_) => {
                warn!(
                    position = %position.id,
                    timeout_ms = self.ack_timeout.as_millis() as u64,
                    "exit acknowledgment timed out, closing at mark"
                );
                mark_price
            }
        };

        if let Err(err) = self.orchestrator.confirm_exit(position.id, exit_price) {
            warn!(position = %position.id, %err, "exit confirmation failed");
        }
    }

    /// Run sweeps on a fixed cadence until shutdown. The in-progress sweep
    /// always completes before the task returns.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                changed = shutdown.changed() => {
                    // A dropped sender also means nobody will signal again.
                    if changed.is_err() || *shutdown.borrow() {
                        // Final pass so a touched stop is not dropped on the
                        // way out.
                        self.sweep().await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tickflow_core::error::GatewayError;
    use tickflow_core::traits::EntryOrder;
    use tickflow_core::types::Setup;
    use tickflow_risk::RiskBudget;

    struct CountingGateway {
        exits: AtomicUsize,
    }

    #[async_trait]
    impl OrderGateway for CountingGateway {
        async fn submit_entry(&self, order: &EntryOrder) -> Result<OrderAck, GatewayError> {
            Ok(OrderAck::Accepted {
                fill_price: order.reference_price,
            })
        }

        async fn submit_exit(&self, _order: &ExitOrder) -> Result<OrderAck, GatewayError> {
            self.exits.fetch_add(1, Ordering::SeqCst);
            Ok(OrderAck::Accepted {
                fill_price: dec!(97.5),
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn open_position(orch: &PortfolioOrchestrator, instrument: &str) -> Position {
        let setup = Setup {
            instrument_id: instrument.to_string(),
            timestamp: Utc::now(),
            direction: Direction::Long,
            reference_price: dec!(100),
            proposed_stop: dec!(98),
            proposed_target: dec!(104),
            validator: "test".to_string(),
        };
        let position = orch.request_entry(&setup, dec!(5), dec!(10)).unwrap();
        orch.confirm_entry(position.id, dec!(100)).unwrap();
        orch.position(position.id).unwrap()
    }

    fn monitor(
        orch: Arc<PortfolioOrchestrator>,
        prices: Arc<PriceBoard>,
        gateway: Arc<CountingGateway>,
    ) -> ExitMonitor {
        ExitMonitor::new(
            orch,
            gateway,
            prices,
            ExitPrecedence::StopFirst,
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_decide_long() {
        let orch = PortfolioOrchestrator::new(RiskBudget::new(dec!(1000)));
        let position = open_position(&orch, "A");

        assert_eq!(
            ExitMonitor::decide(&position, dec!(97), ExitPrecedence::StopFirst),
            Some(ExitReason::StopHit)
        );
        assert_eq!(
            ExitMonitor::decide(&position, dec!(105), ExitPrecedence::StopFirst),
            Some(ExitReason::TargetHit)
        );
        assert_eq!(
            ExitMonitor::decide(&position, dec!(100), ExitPrecedence::StopFirst),
            None
        );
    }

    #[test]
    fn test_decide_short() {
        let orch = PortfolioOrchestrator::new(RiskBudget::new(dec!(1000)));
        let setup = Setup {
            instrument_id: "S".to_string(),
            timestamp: Utc::now(),
            direction: Direction::Short,
            reference_price: dec!(100),
            proposed_stop: dec!(102),
            proposed_target: dec!(96),
            validator: "test".to_string(),
        };
        let position = orch.request_entry(&setup, dec!(5), dec!(10)).unwrap();
        orch.confirm_entry(position.id, dec!(100)).unwrap();
        let position = orch.position(position.id).unwrap();

        assert_eq!(
            ExitMonitor::decide(&position, dec!(103), ExitPrecedence::StopFirst),
            Some(ExitReason::StopHit)
        );
        assert_eq!(
            ExitMonitor::decide(&position, dec!(95), ExitPrecedence::StopFirst),
            Some(ExitReason::TargetHit)
        );
    }

    #[tokio::test]
    async fn test_exactly_one_exit_across_repeated_sweeps() {
        let orch = Arc::new(PortfolioOrchestrator::new(RiskBudget::new(dec!(1000))));
        let prices = Arc::new(PriceBoard::new());
        let gateway = Arc::new(CountingGateway { exits: AtomicUsize::new(0) });
        let position = open_position(&orch, "A");

        // Price crosses the stop and stays below it for several sweeps.
        prices.update("A", dec!(97.5));
        let monitor = monitor(orch.clone(), prices.clone(), gateway.clone());

        let mut initiated = 0;
        for _ in 0..5 {
            initiated += monitor.sweep().await;
        }

        assert_eq!(initiated, 1);
        assert_eq!(gateway.exits.load(Ordering::SeqCst), 1);
        assert!(orch.position(position.id).is_none()); // closed
        assert_eq!(orch.reserved_risk(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_gap_through_both_levels_prefers_stop() {
        let orch = Arc::new(PortfolioOrchestrator::new(RiskBudget::new(dec!(1000))));
        let prices = Arc::new(PriceBoard::new());
        let gateway = Arc::new(CountingGateway { exits: AtomicUsize::new(0) });

        // A degenerate position whose stop sits above its target: any price
        // at or below the stop and at or above the target touches both.
        let setup = Setup {
            instrument_id: "G".to_string(),
            timestamp: Utc::now(),
            direction: Direction::Long,
            reference_price: dec!(100),
            proposed_stop: dec!(101),
            proposed_target: dec!(99),
            validator: "test".to_string(),
        };
        let position = orch.request_entry(&setup, dec!(1), dec!(1)).unwrap();
        orch.confirm_entry(position.id, dec!(100)).unwrap();

        prices.update("G", dec!(100));
        let monitor = monitor(orch.clone(), prices.clone(), gateway.clone());
        monitor.sweep().await;

        let closed = orch.snapshot().closed;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].exit_reason, Some(ExitReason::StopHit));
    }

    #[tokio::test]
    async fn test_no_exit_without_price() {
        let orch = Arc::new(PortfolioOrchestrator::new(RiskBudget::new(dec!(1000))));
        let prices = Arc::new(PriceBoard::new());
        let gateway = Arc::new(CountingGateway { exits: AtomicUsize::new(0) });
        open_position(&orch, "A");

        let monitor = monitor(orch.clone(), prices, gateway.clone());
        assert_eq!(monitor.sweep().await, 0);
        assert_eq!(gateway.exits.load(Ordering::SeqCst), 0);
    }
}
