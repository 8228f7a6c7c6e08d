//! Risk-based position sizing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tickflow_core::types::Setup;

use crate::budget::RiskBudget;

/// Why a setup was not sized into an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Stop equals the reference price; risk per share is undefined
    InvalidStop,
    /// Available capital cannot buy even one share
    CapitalInsufficient,
    /// Reservation would breach the daily risk cap
    RiskBudgetExceeded,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidStop => write!(f, "invalid stop"),
            RejectReason::CapitalInsufficient => write!(f, "capital insufficient"),
            RejectReason::RiskBudgetExceeded => write!(f, "risk budget exceeded"),
        }
    }
}

/// Outcome of sizing one setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SizingDecision {
    /// Setup sized into a concrete quantity with its risk reservation
    Accepted {
        quantity: Decimal,
        risk_reserved: Decimal,
    },
    /// Setup dropped; no entry is attempted
    Rejected { reason: RejectReason },
}

impl SizingDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SizingDecision::Accepted { .. })
    }
}

/// Converts a setup into an accept/reject sizing decision.
///
/// Pure: reads the budget, never mutates it. The reservation itself happens
/// in the orchestrator, atomically with position creation, so sizing and
/// commit cannot race.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    risk_per_trade_fraction: Decimal,
}

impl PositionSizer {
    /// Create a sizer risking `daily_cap * fraction` per trade.
    ///
    /// The original risk model splits the daily risk across the planned
    /// number of trades, so `fraction` is typically
    /// `daily_risk / planned_trades`.
    pub fn new(risk_per_trade_fraction: Decimal) -> Self {
        Self {
            risk_per_trade_fraction,
        }
    }

    /// Size a setup against the current budget and capital.
    pub fn size(
        &self,
        setup: &Setup,
        budget: &RiskBudget,
        available_capital: Decimal,
    ) -> SizingDecision {
        let stop_distance = setup.stop_distance();
        if stop_distance <= Decimal::ZERO {
            return SizingDecision::Rejected {
                reason: RejectReason::InvalidStop,
            };
        }

        let risk_amount = budget.daily_cap() * self.risk_per_trade_fraction;
        let mut quantity = (risk_amount / stop_distance).floor();

        // Clamp to what the capital can actually buy.
        if quantity * setup.reference_price > available_capital {
            quantity = (available_capital / setup.reference_price).floor();
        }
        if quantity <= Decimal::ZERO {
            return SizingDecision::Rejected {
                reason: RejectReason::CapitalInsufficient,
            };
        }

        let risk_reserved = quantity * stop_distance;
        if !budget.fits(risk_reserved) {
            return SizingDecision::Rejected {
                reason: RejectReason::RiskBudgetExceeded,
            };
        }

        SizingDecision::Accepted {
            quantity,
            risk_reserved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tickflow_core::types::Direction;

    fn setup(reference: Decimal, stop: Decimal) -> Setup {
        Setup {
            instrument_id: "TEST".to_string(),
            timestamp: Utc::now(),
            direction: Direction::Long,
            reference_price: reference,
            proposed_stop: stop,
            proposed_target: reference * dec!(1.04),
            validator: "test".to_string(),
        }
    }

    #[test]
    fn test_capital_clamp_scenario() {
        // daily_cap $1000, fraction 0.01 -> risk $10; ref 100, stop 98 ->
        // distance 2 -> raw qty 5; capital $400 clamps to 4 shares, $8 risk.
        let sizer = PositionSizer::new(dec!(0.01));
        let budget = RiskBudget::new(dec!(1000));

        let decision = sizer.size(&setup(dec!(100), dec!(98)), &budget, dec!(400));
        assert_eq!(
            decision,
            SizingDecision::Accepted {
                quantity: dec!(4),
                risk_reserved: dec!(8),
            }
        );
    }

    #[test]
    fn test_unclamped_quantity() {
        let sizer = PositionSizer::new(dec!(0.01));
        let budget = RiskBudget::new(dec!(1000));

        let decision = sizer.size(&setup(dec!(100), dec!(98)), &budget, dec!(100000));
        assert_eq!(
            decision,
            SizingDecision::Accepted {
                quantity: dec!(5),
                risk_reserved: dec!(10),
            }
        );
    }

    #[test]
    fn test_invalid_stop() {
        let sizer = PositionSizer::new(dec!(0.01));
        let budget = RiskBudget::new(dec!(1000));

        let decision = sizer.size(&setup(dec!(100), dec!(100)), &budget, dec!(1000));
        assert_eq!(
            decision,
            SizingDecision::Rejected {
                reason: RejectReason::InvalidStop
            }
        );
    }

    #[test]
    fn test_capital_insufficient() {
        let sizer = PositionSizer::new(dec!(0.01));
        let budget = RiskBudget::new(dec!(1000));

        // Cannot afford a single share at 100.
        let decision = sizer.size(&setup(dec!(100), dec!(98)), &budget, dec!(50));
        assert_eq!(
            decision,
            SizingDecision::Rejected {
                reason: RejectReason::CapitalInsufficient
            }
        );
    }

    #[test]
    fn test_risk_budget_exceeded() {
        let sizer = PositionSizer::new(dec!(0.01));
        let mut budget = RiskBudget::new(dec!(1000));
        assert!(budget.try_reserve(dec!(995)));

        // Needs $10 of headroom, only $5 left.
        let decision = sizer.size(&setup(dec!(100), dec!(98)), &budget, dec!(100000));
        assert_eq!(
            decision,
            SizingDecision::Rejected {
                reason: RejectReason::RiskBudgetExceeded
            }
        );
    }

    #[test]
    fn test_sizer_never_mutates_budget() {
        let sizer = PositionSizer::new(dec!(0.01));
        let budget = RiskBudget::new(dec!(1000));
        let before = budget.clone();

        sizer.size(&setup(dec!(100), dec!(98)), &budget, dec!(400));
        assert_eq!(budget, before);
    }
}
