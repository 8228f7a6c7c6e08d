//! Error types for the trading engine.

use thiserror::Error;
use uuid::Uuid;

use crate::types::PositionStatus;

/// Top-level engine error.
#[derive(Error, Debug)]
pub enum TickflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Validator error: {0}")]
    Validator(#[from] ValidatorError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Tick aggregation errors.
///
/// Duplicate sequence numbers are NOT errors (silent no-op on replay);
/// only a strictly older sequence is rejected.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error(
        "Out-of-order tick for {instrument_id}: sequence {received} after {last_applied}"
    )]
    OutOfOrderTick {
        instrument_id: String,
        last_applied: u64,
        received: u64,
    },
}

/// Setup validator failures.
///
/// Always isolated at the per-instrument boundary: one instrument's failed
/// evaluation never aborts the others.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Invalid validator configuration: {0}")]
    InvalidConfig(String),

    #[error("Validator not found: {0}")]
    NotFound(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

/// Portfolio orchestrator errors.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Duplicate entry attempt for {instrument_id}: position {existing} is {status:?}")]
    DuplicateEntryAttempt {
        instrument_id: String,
        existing: Uuid,
        status: PositionStatus,
    },

    #[error("Position not found: {0}")]
    PositionNotFound(Uuid),

    #[error("Risk budget exhausted at commit: requested {requested}, available {available}")]
    BudgetExhausted {
        requested: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Invalid transition for position {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: PositionStatus,
        to: PositionStatus,
    },
}

/// Order gateway errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Acknowledgment timed out after {timeout_ms} ms")]
    AckTimeout { timeout_ms: u64 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Gateway error: {0}")]
    Internal(String),
}

/// Tick source / replay errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No ticks available in {0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations.
pub type TickflowResult<T> = Result<T, TickflowError>;
