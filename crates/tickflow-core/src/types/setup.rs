//! Candidate trade setups emitted by validators.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Sign for P&L math (+1 long, -1 short).
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => -Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A candidate trade signal produced by a setup validator.
///
/// Ephemeral: consumed immediately by the sizer, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    /// Instrument identifier
    pub instrument_id: String,
    /// When the setup was identified
    pub timestamp: DateTime<Utc>,
    /// Long or short
    pub direction: Direction,
    /// Intended entry price
    pub reference_price: Decimal,
    /// Proposed protective stop
    pub proposed_stop: Decimal,
    /// Proposed profit target
    pub proposed_target: Decimal,
    /// Name of the validator that produced the setup
    pub validator: String,
}

impl Setup {
    /// Distance between entry and stop. Must be positive for a valid setup.
    pub fn stop_distance(&self) -> Decimal {
        (self.reference_price - self.proposed_stop).abs()
    }
}
