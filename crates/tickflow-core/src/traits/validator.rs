//! Setup validator trait definition.

use chrono::{DateTime, Utc};

use crate::error::ValidatorError;
use crate::types::{EvalSnapshot, Setup};

/// Pluggable trade-setup predicate.
///
/// The engine guarantees the contract around implementations:
/// - `evaluate` receives an owned, immutable snapshot per instrument per
///   evaluation; concurrent bar closures never mutate it.
/// - Failures are isolated per instrument; an `Err` skips only that
///   instrument's cycle.
/// - The session time-window gate runs in the engine BEFORE `evaluate` is
///   invoked; implementations do not re-check it.
/// - Re-evaluation happens after bar updates for the instrument, not on
///   every tick of unrelated timeframes.
pub trait SetupValidator: Send + Sync {
    /// Unique name of this validator.
    fn name(&self) -> &str;

    /// Evaluate the snapshot and produce at most one candidate setup.
    ///
    /// Returning `Ok(None)` means "no setup here" — including whenever a
    /// required indicator is still warming up.
    fn evaluate(
        &self,
        snapshot: &EvalSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<Setup>, ValidatorError>;

    /// Closed daily bars required before evaluation is meaningful.
    fn required_bars(&self) -> usize;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct AlwaysNone;

    impl SetupValidator for AlwaysNone {
        fn name(&self) -> &str {
            "always_none"
        }

        fn evaluate(
            &self,
            _snapshot: &EvalSnapshot,
            _now: DateTime<Utc>,
        ) -> Result<Option<Setup>, ValidatorError> {
            Ok(None)
        }

        fn required_bars(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_object_safety() {
        let validator: Box<dyn SetupValidator> = Box::new(AlwaysNone);
        let snapshot = EvalSnapshot {
            instrument_id: "TEST".to_string(),
            evaluated_at: Utc::now(),
            last_price: 100.0,
            session_bar: None,
            timeframes: BTreeMap::new(),
        };
        assert!(validator.evaluate(&snapshot, Utc::now()).unwrap().is_none());
    }
}
