//! Shared daily risk budget.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate capital-at-risk permitted across pending and open positions in
/// one trading session.
///
/// Mutated only by the portfolio orchestrator, inside its transaction lock.
/// The sizer reads it; nothing else touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBudget {
    daily_cap: Decimal,
    used_today: Decimal,
}

impl RiskBudget {
    /// Create a fresh budget with the given session cap.
    pub fn new(daily_cap: Decimal) -> Self {
        Self {
            daily_cap,
            used_today: Decimal::ZERO,
        }
    }

    /// The session cap.
    pub fn daily_cap(&self) -> Decimal {
        self.daily_cap
    }

    /// Risk reserved so far this session.
    pub fn used_today(&self) -> Decimal {
        self.used_today
    }

    /// Remaining headroom.
    pub fn available(&self) -> Decimal {
        self.daily_cap - self.used_today
    }

    /// Check whether `amount` fits without breaching the cap.
    pub fn fits(&self, amount: Decimal) -> bool {
        self.used_today + amount <= self.daily_cap
    }

    /// Reserve `amount` against the cap. Returns false, unchanged, if the
    /// reservation would breach it.
    pub fn try_reserve(&mut self, amount: Decimal) -> bool {
        if !self.fits(amount) {
            return false;
        }
        self.used_today += amount;
        true
    }

    /// Release a previous reservation.
    pub fn release(&mut self, amount: Decimal) {
        self.used_today = (self.used_today - amount).max(Decimal::ZERO);
    }

    /// Reset for a new trading session.
    pub fn reset(&mut self) {
        self.used_today = Decimal::ZERO;
    }
}
