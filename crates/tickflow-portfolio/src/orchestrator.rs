//! Single authority over position lifecycle and the daily risk budget.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use tickflow_core::error::OrchestratorError;
use tickflow_core::types::{ExitReason, Position, PositionStatus, Setup};
use tickflow_risk::RiskBudget;

/// Serializable view of the book for the persistence collaborator.
///
/// The wire/file format is the collaborator's problem; this type only has
/// to round-trip through serde.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PortfolioSnapshot {
    /// Active (non-Closed) positions
    pub active: Vec<Position>,
    /// Closed positions retained for audit
    pub closed: Vec<Position>,
    /// Risk budget state
    pub budget: RiskBudget,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

struct Book {
    positions: HashMap<Uuid, Position>,
    by_instrument: HashMap<String, Uuid>,
    closed: Vec<Position>,
    budget: RiskBudget,
}

/// The portfolio orchestrator.
///
/// Every mutation of the position book or the risk budget goes through this
/// type, under one lock, so reserving risk and creating a position are a
/// single transaction. Per instrument the lifecycle is
/// `PendingEntry → Open → Exiting → Closed`; at most one non-Closed
/// position exists per instrument at any time.
pub struct PortfolioOrchestrator {
    inner: Mutex<Book>,
}

impl PortfolioOrchestrator {
    /// Create an orchestrator with a fresh book and the given budget.
    pub fn new(budget: RiskBudget) -> Self {
        Self {
            inner: Mutex::new(Book {
                positions: HashMap::new(),
                by_instrument: HashMap::new(),
                closed: Vec::new(),
                budget,
            }),
        }
    }

    /// Atomically reserve risk and create a PendingEntry position.
    ///
    /// Fails with `DuplicateEntryAttempt` if the instrument already has a
    /// non-Closed position, and with `BudgetExhausted` if the reservation
    /// no longer fits — the sizer's check ran outside this lock, so it is
    /// repeated here before anything is mutated.
    pub fn request_entry(
        &self,
        setup: &Setup,
        quantity: Decimal,
        risk_reserved: Decimal,
    ) -> Result<Position, OrchestratorError> {
        let mut book = self.inner.lock().unwrap();

        if let Some(existing_id) = book.by_instrument.get(&setup.instrument_id) {
            let existing = &book.positions[existing_id];
            warn!(
                instrument = %setup.instrument_id,
                position = %existing.id,
                status = ?existing.status,
                "duplicate entry attempt"
            );
            return Err(OrchestratorError::DuplicateEntryAttempt {
                instrument_id: setup.instrument_id.clone(),
                existing: existing.id,
                status: existing.status,
            });
        }

        if !book.budget.try_reserve(risk_reserved) {
            return Err(OrchestratorError::BudgetExhausted {
                requested: risk_reserved,
                available: book.budget.available(),
            });
        }

        let position = Position::pending(
            setup.instrument_id.clone(),
            setup.direction,
            setup.reference_price,
            quantity,
            setup.proposed_stop,
            setup.proposed_target,
            risk_reserved,
            setup.timestamp,
        );
        book.by_instrument
            .insert(setup.instrument_id.clone(), position.id);
        book.positions.insert(position.id, position.clone());

        info!(
            instrument = %setup.instrument_id,
            position = %position.id,
            quantity = %quantity,
            risk = %risk_reserved,
            "entry requested"
        );
        Ok(position)
    }

    /// Entry fill acknowledged: PendingEntry → Open.
    pub fn confirm_entry(&self, id: Uuid, fill_price: Decimal) -> Result<(), OrchestratorError> {
        let mut book = self.inner.lock().unwrap();
        let position = book
            .positions
            .get_mut(&id)
            .ok_or(OrchestratorError::PositionNotFound(id))?;

        if position.status != PositionStatus::PendingEntry {
            return Err(OrchestratorError::InvalidTransition {
                id,
                from: position.status,
                to: PositionStatus::Open,
            });
        }
        position.entry_price = fill_price;
        position.status = PositionStatus::Open;
        info!(position = %id, fill = %fill_price, "entry confirmed");
        Ok(())
    }

    /// Entry failed (gateway rejection or acknowledgment timeout):
    /// PendingEntry → Closed, reserved risk released.
    ///
    /// A failed entry is a normal outcome, not an error.
    pub fn fail_entry(&self, id: Uuid) -> Result<(), OrchestratorError> {
        let mut book = self.inner.lock().unwrap();
        let position = book
            .positions
            .get_mut(&id)
            .ok_or(OrchestratorError::PositionNotFound(id))?;

        if position.status != PositionStatus::PendingEntry {
            return Err(OrchestratorError::InvalidTransition {
                id,
                from: position.status,
                to: PositionStatus::Closed,
            });
        }
        position.status = PositionStatus::Closed;
        position.closed_at = Some(Utc::now());
        position.exit_reason = Some(ExitReason::EntryTimeout);
        let released = position.risk_reserved;
        let finished = position.clone();

        book.budget.release(released);
        book.by_instrument.remove(&finished.instrument_id);
        book.positions.remove(&id);
        book.closed.push(finished);

        warn!(position = %id, released = %released, "entry failed, risk released");
        Ok(())
    }

    /// Request an exit: Open → Exiting.
    ///
    /// Idempotent: returns `Ok(false)` without state change if the position
    /// is already Exiting (or already Closed by a concurrent confirmation);
    /// `Ok(true)` means this call initiated the exit and the caller should
    /// submit the exit order.
    pub fn request_exit(&self, id: Uuid, reason: ExitReason) -> Result<bool, OrchestratorError> {
        let mut book = self.inner.lock().unwrap();
        let position = book
            .positions
            .get_mut(&id)
            .ok_or(OrchestratorError::PositionNotFound(id))?;

        match position.status {
            PositionStatus::Open => {
                position.status = PositionStatus::Exiting;
                position.exit_reason = Some(reason);
                info!(position = %id, %reason, "exit requested");
                Ok(true)
            }
            PositionStatus::Exiting => Ok(false),
            from => Err(OrchestratorError::InvalidTransition {
                id,
                from,
                to: PositionStatus::Exiting,
            }),
        }
    }

    /// Exit fill acknowledged: Exiting → Closed. Releases reserved risk and
    /// finalizes the realized P&L record.
    pub fn confirm_exit(&self, id: Uuid, exit_price: Decimal) -> Result<Position, OrchestratorError> {
        let mut book = self.inner.lock().unwrap();
        let position = book
            .positions
            .get_mut(&id)
            .ok_or(OrchestratorError::PositionNotFound(id))?;

        if position.status != PositionStatus::Exiting {
            return Err(OrchestratorError::InvalidTransition {
                id,
                from: position.status,
                to: PositionStatus::Closed,
            });
        }
        position.status = PositionStatus::Closed;
        position.closed_at = Some(Utc::now());
        position.realized_pnl = position.pnl_at(exit_price);
        let finished = position.clone();

        book.budget.release(finished.risk_reserved);
        book.by_instrument.remove(&finished.instrument_id);
        book.positions.remove(&id);
        book.closed.push(finished.clone());

        info!(
            position = %id,
            exit = %exit_price,
            pnl = %finished.realized_pnl,
            "exit confirmed"
        );
        Ok(finished)
    }

    /// The active (non-Closed) position for an instrument, if any.
    pub fn active_position(&self, instrument_id: &str) -> Option<Position> {
        let book = self.inner.lock().unwrap();
        let id = book.by_instrument.get(instrument_id)?;
        book.positions.get(id).cloned()
    }

    /// A position by ID (active positions only).
    pub fn position(&self, id: Uuid) -> Option<Position> {
        self.inner.lock().unwrap().positions.get(&id).cloned()
    }

    /// All Open positions, for the exit monitor's sweep.
    pub fn open_positions(&self) -> Vec<Position> {
        let book = self.inner.lock().unwrap();
        book.positions
            .values()
            .filter(|p| p.status == PositionStatus::Open)
            .cloned()
            .collect()
    }

    /// Sum of reserved risk over positions that hold it.
    pub fn reserved_risk(&self) -> Decimal {
        let book = self.inner.lock().unwrap();
        book.positions
            .values()
            .filter(|p| p.status.holds_risk())
            .map(|p| p.risk_reserved)
            .sum()
    }

    /// Risk budget headroom remaining this session.
    pub fn budget_available(&self) -> Decimal {
        self.inner.lock().unwrap().budget.available()
    }

    /// Clone of the current budget state, for the sizer.
    pub fn budget(&self) -> RiskBudget {
        self.inner.lock().unwrap().budget.clone()
    }

    /// Reset the budget for a new trading session.
    pub fn reset_session(&self) {
        self.inner.lock().unwrap().budget.reset();
    }

    /// Consistent snapshot of the whole book.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        let book = self.inner.lock().unwrap();
        PortfolioSnapshot {
            active: book.positions.values().cloned().collect(),
            closed: book.closed.clone(),
            budget: book.budget.clone(),
            taken_at: Utc::now(),
        }
    }

    /// Restore the book from a snapshot at startup.
    pub fn restore(&self, snapshot: PortfolioSnapshot) {
        let mut book = self.inner.lock().unwrap();
        book.positions.clear();
        book.by_instrument.clear();
        for position in snapshot.active {
            book.by_instrument
                .insert(position.instrument_id.clone(), position.id);
            book.positions.insert(position.id, position);
        }
        book.closed = snapshot.closed;
        book.budget = snapshot.budget;
    }
}
