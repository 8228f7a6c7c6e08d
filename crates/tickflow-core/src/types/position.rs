//! Position lifecycle types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Direction;

/// Lifecycle status of a position.
///
/// `None → PendingEntry → Open → Exiting → Closed`; Closed is terminal and
/// frees the instrument for the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// Entry requested, risk reserved, awaiting fill acknowledgment
    PendingEntry,
    /// Entry filled, position live
    Open,
    /// Exit requested, awaiting exit acknowledgment
    Exiting,
    /// Exit confirmed or entry failed; terminal
    Closed,
}

impl PositionStatus {
    /// Check whether the position still counts against the instrument slot
    /// and the risk budget.
    pub fn is_active(&self) -> bool {
        !matches!(self, PositionStatus::Closed)
    }

    /// Check whether reserved risk is still held for this status.
    pub fn holds_risk(&self) -> bool {
        matches!(self, PositionStatus::PendingEntry | PositionStatus::Open)
    }
}

/// Why an exit was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Stop price touched
    StopHit,
    /// Target price touched
    TargetHit,
    /// Operator- or shutdown-initiated
    Manual,
    /// Entry acknowledgment never arrived
    EntryTimeout,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopHit => write!(f, "stop_hit"),
            ExitReason::TargetHit => write!(f, "target_hit"),
            ExitReason::Manual => write!(f, "manual"),
            ExitReason::EntryTimeout => write!(f, "entry_timeout"),
        }
    }
}

/// A tracked trade from entry through exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique position ID
    pub id: Uuid,
    /// Instrument identifier
    pub instrument_id: String,
    /// Long or short
    pub direction: Direction,
    /// Fill price (reference price until the fill is confirmed)
    pub entry_price: Decimal,
    /// Number of shares
    pub quantity: Decimal,
    /// Protective stop
    pub stop: Decimal,
    /// Profit target
    pub target: Decimal,
    /// Lifecycle status
    pub status: PositionStatus,
    /// Capital-at-risk reserved against the daily budget
    pub risk_reserved: Decimal,
    /// When the entry was requested
    pub opened_at: DateTime<Utc>,
    /// When the position reached Closed
    pub closed_at: Option<DateTime<Utc>>,
    /// Why the position exited, if it did
    pub exit_reason: Option<ExitReason>,
    /// Realized P&L, recorded at exit confirmation
    pub realized_pnl: Decimal,
}

impl Position {
    /// Create a new PendingEntry position with reserved risk.
    pub fn pending(
        instrument_id: impl Into<String>,
        direction: Direction,
        entry_price: Decimal,
        quantity: Decimal,
        stop: Decimal,
        target: Decimal,
        risk_reserved: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            direction,
            entry_price,
            quantity,
            stop,
            target,
            status: PositionStatus::PendingEntry,
            risk_reserved,
            opened_at,
            closed_at: None,
            exit_reason: None,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// P&L of closing the full position at `exit_price`.
    pub fn pnl_at(&self, exit_price: Decimal) -> Decimal {
        self.direction.sign() * (exit_price - self.entry_price) * self.quantity
    }

    /// Unsigned per-share distance from entry to stop.
    pub fn stop_distance(&self) -> Decimal {
        (self.entry_price - self.stop).abs()
    }
}
