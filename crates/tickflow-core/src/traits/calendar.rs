//! Session calendar trait definition.

use chrono::{DateTime, Utc};

use crate::types::Timeframe;

/// Period bounds of one aggregation window, Unix millis, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    /// Inclusive start
    pub start: i64,
    /// Exclusive end
    pub end: i64,
}

impl PeriodBounds {
    /// Check whether a timestamp falls inside the period.
    pub fn contains(&self, ts_millis: i64) -> bool {
        ts_millis >= self.start && ts_millis < self.end
    }
}

/// Exchange-calendar policy: where periods start and end, and when the
/// trading session is open.
///
/// Exact cutover rules (week start, month boundaries, holidays, session
/// hours) are environment-specific, so they are injected rather than
/// hard-coded in the aggregation scheduler.
pub trait SessionCalendar: Send + Sync {
    /// Bounds of the period containing `ts_millis` at the given timeframe.
    fn period_bounds(&self, timeframe: Timeframe, ts_millis: i64) -> PeriodBounds;

    /// Check whether the trading session is open at `now`.
    fn in_session(&self, now: DateTime<Utc>) -> bool;

    /// Check whether new entries are permitted at `now`.
    ///
    /// Narrower than `in_session`: an engine may only take entries during a
    /// configured window (e.g. the final minutes before close).
    fn in_entry_window(&self, now: DateTime<Utc>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let bounds = PeriodBounds { start: 100, end: 200 };
        assert!(bounds.contains(100));
        assert!(bounds.contains(199));
        assert!(!bounds.contains(200));
        assert!(!bounds.contains(99));
    }
}
