//! Normalized market ticks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized trade tick for one instrument.
///
/// Produced by the transport collaborator. `sequence_no` increases per
/// instrument; the aggregation layer uses it to drop replayed duplicates
/// after a reconnect and to reject out-of-order delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Instrument identifier
    pub instrument_id: String,
    /// Last traded price
    pub price: f64,
    /// Traded volume attributed to this tick
    pub volume: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Per-instrument delivery sequence number
    pub sequence_no: u64,
}

impl Tick {
    /// Create a new tick.
    pub fn new(
        instrument_id: impl Into<String>,
        price: f64,
        volume: f64,
        timestamp: i64,
        sequence_no: u64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            price,
            volume,
            timestamp,
            sequence_no,
        }
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }
}
