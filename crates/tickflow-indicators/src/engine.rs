//! Per-(instrument, timeframe) indicator engine.

use std::collections::{BTreeMap, HashMap};

use tickflow_core::types::{Bar, Timeframe, TimeframeSnapshot};

use crate::moving_average::MovingAverageSet;

/// Indicator state derived from closed bars.
///
/// Updated only on bar closure — never per tick — so a moving average is
/// always a function of complete periods. Queries return owned snapshots;
/// callers never observe a half-applied update.
pub struct IndicatorEngine {
    windows: Vec<usize>,
    states: HashMap<(String, Timeframe), SeriesState>,
}

struct SeriesState {
    averages: MovingAverageSet,
    last_closed: Option<Bar>,
    bars_seen: usize,
}

impl IndicatorEngine {
    /// Create an engine computing the given moving-average windows on every
    /// (instrument, timeframe) series it observes.
    pub fn new(windows: &[usize]) -> Self {
        Self {
            windows: windows.to_vec(),
            states: HashMap::new(),
        }
    }

    /// Fold a closed bar into the series it belongs to.
    pub fn on_bar_closed(&mut self, bar: &Bar) {
        let key = (bar.instrument_id.clone(), bar.timeframe);
        let state = self.states.entry(key).or_insert_with(|| SeriesState {
            averages: MovingAverageSet::new(&self.windows),
            last_closed: None,
            bars_seen: 0,
        });
        state.averages.push(bar.close);
        state.last_closed = Some(bar.clone());
        state.bars_seen += 1;
    }

    /// Snapshot of one (instrument, timeframe) series.
    ///
    /// Returns `None` for series that have never closed a bar.
    pub fn current_state(&self, instrument_id: &str, timeframe: Timeframe) -> Option<TimeframeSnapshot> {
        self.states
            .get(&(instrument_id.to_string(), timeframe))
            .map(|state| TimeframeSnapshot {
                last_closed: state.last_closed.clone(),
                bars_seen: state.bars_seen,
                averages: state.averages.values(),
            })
    }

    /// Snapshots for every timeframe of one instrument that has data.
    pub fn instrument_state(&self, instrument_id: &str) -> BTreeMap<Timeframe, TimeframeSnapshot> {
        Timeframe::all()
            .iter()
            .filter_map(|&tf| self.current_state(instrument_id, tf).map(|s| (tf, s)))
            .collect()
    }

    /// Configured window lengths.
    pub fn windows(&self) -> &[usize] {
        &self.windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickflow_core::types::{IndicatorValue, Tick};

    fn closed_bar(instrument: &str, tf: Timeframe, start: i64, close: f64) -> Bar {
        let tick = Tick::new(instrument, close, 100.0, start, 0);
        Bar::open_from_tick(&tick, tf, start, start + 1)
    }

    #[test]
    fn test_state_per_series() {
        let mut engine = IndicatorEngine::new(&[2]);
        engine.on_bar_closed(&closed_bar("A", Timeframe::Daily, 0, 10.0));
        engine.on_bar_closed(&closed_bar("A", Timeframe::Daily, 1, 20.0));
        engine.on_bar_closed(&closed_bar("A", Timeframe::Weekly, 0, 99.0));
        engine.on_bar_closed(&closed_bar("B", Timeframe::Daily, 0, 50.0));

        let daily = engine.current_state("A", Timeframe::Daily).unwrap();
        assert_eq!(daily.bars_seen, 2);
        assert_eq!(daily.ma_ready(2), Some(15.0));

        let weekly = engine.current_state("A", Timeframe::Weekly).unwrap();
        assert_eq!(weekly.bars_seen, 1);
        assert!(matches!(
            weekly.ma(2),
            Some(IndicatorValue::Warmup { have: 1, need: 2 })
        ));

        assert!(engine.current_state("B", Timeframe::Weekly).is_none());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut engine = IndicatorEngine::new(&[2]);
        engine.on_bar_closed(&closed_bar("A", Timeframe::Daily, 0, 10.0));
        engine.on_bar_closed(&closed_bar("A", Timeframe::Daily, 1, 20.0));

        let before = engine.current_state("A", Timeframe::Daily).unwrap();
        engine.on_bar_closed(&closed_bar("A", Timeframe::Daily, 2, 90.0));

        // The earlier snapshot must not move with the live state.
        assert_eq!(before.ma_ready(2), Some(15.0));
        let after = engine.current_state("A", Timeframe::Daily).unwrap();
        assert_eq!(after.ma_ready(2), Some(55.0));
    }

    #[test]
    fn test_instrument_state_collects_timeframes() {
        let mut engine = IndicatorEngine::new(&[1]);
        engine.on_bar_closed(&closed_bar("A", Timeframe::Daily, 0, 10.0));
        engine.on_bar_closed(&closed_bar("A", Timeframe::Monthly, 0, 10.0));

        let state = engine.instrument_state("A");
        assert_eq!(state.len(), 2);
        assert!(state.contains_key(&Timeframe::Daily));
        assert!(state.contains_key(&Timeframe::Monthly));
    }
}
