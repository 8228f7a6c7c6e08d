//! Immutable evaluation snapshots handed to setup validators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Bar, Timeframe};

/// A moving-average reading.
///
/// Warm-up is an explicit state so downstream logic can never mistake a
/// half-filled window for a real signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum IndicatorValue {
    /// Window full; the average is meaningful
    Ready { value: f64 },
    /// Fewer than `need` closed bars observed so far
    Warmup { have: usize, need: usize },
}

impl IndicatorValue {
    /// The average, if the window is full.
    pub fn ready(&self) -> Option<f64> {
        match self {
            IndicatorValue::Ready { value } => Some(*value),
            IndicatorValue::Warmup { .. } => None,
        }
    }

    /// Check whether the window is full.
    pub fn is_ready(&self) -> bool {
        matches!(self, IndicatorValue::Ready { .. })
    }
}

/// Indicator state for one (instrument, timeframe), frozen at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimeframeSnapshot {
    /// Most recent closed bar, if any
    pub last_closed: Option<Bar>,
    /// Number of closed bars observed
    pub bars_seen: usize,
    /// Moving averages keyed by window length
    pub averages: BTreeMap<usize, IndicatorValue>,
}

impl TimeframeSnapshot {
    /// Look up a moving average by window length.
    pub fn ma(&self, window: usize) -> Option<&IndicatorValue> {
        self.averages.get(&window)
    }

    /// Look up a moving average and require it to be warmed up.
    pub fn ma_ready(&self, window: usize) -> Option<f64> {
        self.averages.get(&window).and_then(|v| v.ready())
    }
}

/// Everything a setup validator sees for one instrument in one evaluation.
///
/// Owned data, cloned out of the live engine state: concurrent bar closures
/// cannot mutate it mid-evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSnapshot {
    /// Instrument identifier
    pub instrument_id: String,
    /// Timestamp of the tick that triggered the evaluation
    pub evaluated_at: DateTime<Utc>,
    /// Last traded price
    pub last_price: f64,
    /// The in-progress daily bar (today so far), if one is open
    pub session_bar: Option<Bar>,
    /// Per-timeframe closed-bar indicator state
    pub timeframes: BTreeMap<Timeframe, TimeframeSnapshot>,
}

impl EvalSnapshot {
    /// Indicator state for one timeframe.
    pub fn timeframe(&self, tf: Timeframe) -> Option<&TimeframeSnapshot> {
        self.timeframes.get(&tf)
    }

    /// Shortcut for a daily moving average that must be warmed up.
    pub fn daily_ma(&self, window: usize) -> Option<f64> {
        self.timeframe(Timeframe::Daily)?.ma_ready(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_value_states() {
        let ready = IndicatorValue::Ready { value: 101.5 };
        let warmup = IndicatorValue::Warmup { have: 3, need: 9 };

        assert_eq!(ready.ready(), Some(101.5));
        assert!(ready.is_ready());
        assert_eq!(warmup.ready(), None);
        assert!(!warmup.is_ready());
    }

    #[test]
    fn test_snapshot_lookup() {
        let mut tf = TimeframeSnapshot::default();
        tf.averages.insert(9, IndicatorValue::Ready { value: 100.0 });
        tf.averages.insert(200, IndicatorValue::Warmup { have: 10, need: 200 });

        let mut snapshot = EvalSnapshot {
            instrument_id: "TEST".to_string(),
            evaluated_at: Utc::now(),
            last_price: 101.0,
            session_bar: None,
            timeframes: BTreeMap::new(),
        };
        snapshot.timeframes.insert(Timeframe::Daily, tf);

        assert_eq!(snapshot.daily_ma(9), Some(100.0));
        assert_eq!(snapshot.daily_ma(200), None);
        assert_eq!(snapshot.daily_ma(50), None);
    }
}
