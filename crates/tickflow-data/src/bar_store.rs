//! Archive of closed bars per (instrument, timeframe).

use std::collections::{HashMap, VecDeque};

use tickflow_core::types::{Bar, Timeframe};

/// Bounded archive of closed bars.
///
/// Bars arrive from the aggregation scheduler already closed and are
/// read-only from then on. Capacity bounds memory per series; the oldest
/// bar falls off when a new one arrives at capacity.
#[derive(Debug, Clone)]
pub struct BarStore {
    series: HashMap<(String, Timeframe), VecDeque<Bar>>,
    capacity: usize,
}

impl BarStore {
    /// Create a store keeping up to `capacity` closed bars per series.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            series: HashMap::new(),
            capacity,
        }
    }

    /// Archive a closed bar.
    pub fn push(&mut self, bar: Bar) {
        let key = (bar.instrument_id.clone(), bar.timeframe);
        let bars = self.series.entry(key).or_default();
        if bars.len() >= self.capacity {
            bars.pop_front();
        }
        bars.push_back(bar);
    }

    /// Most recent closed bar of a series.
    pub fn last(&self, instrument_id: &str, timeframe: Timeframe) -> Option<&Bar> {
        self.series
            .get(&(instrument_id.to_string(), timeframe))
            .and_then(|bars| bars.back())
    }

    /// All archived bars of a series, oldest first.
    pub fn bars(&self, instrument_id: &str, timeframe: Timeframe) -> Option<&VecDeque<Bar>> {
        self.series.get(&(instrument_id.to_string(), timeframe))
    }

    /// Number of archived bars in a series.
    pub fn len(&self, instrument_id: &str, timeframe: Timeframe) -> usize {
        self.series
            .get(&(instrument_id.to_string(), timeframe))
            .map(|bars| bars.len())
            .unwrap_or(0)
    }

    /// Check whether the store holds no bars at all.
    pub fn is_empty(&self) -> bool {
        self.series.values().all(|bars| bars.is_empty())
    }

    /// Instruments with at least one archived bar.
    pub fn instruments(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .series
            .keys()
            .map(|(instrument, _)| instrument.as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickflow_core::types::Tick;

    fn bar(instrument: &str, tf: Timeframe, start: i64, close: f64) -> Bar {
        let tick = Tick::new(instrument, close, 1.0, start, 0);
        Bar::open_from_tick(&tick, tf, start, start + 1)
    }

    #[test]
    fn test_push_and_query() {
        let mut store = BarStore::new(10);
        store.push(bar("A", Timeframe::Daily, 0, 10.0));
        store.push(bar("A", Timeframe::Daily, 1, 11.0));
        store.push(bar("A", Timeframe::Weekly, 0, 12.0));

        assert_eq!(store.len("A", Timeframe::Daily), 2);
        assert_eq!(store.last("A", Timeframe::Daily).unwrap().close, 11.0);
        assert_eq!(store.len("A", Timeframe::Weekly), 1);
        assert_eq!(store.len("A", Timeframe::Monthly), 0);
    }

    #[test]
    fn test_capacity_eviction() {
        let mut store = BarStore::new(2);
        store.push(bar("A", Timeframe::Daily, 0, 10.0));
        store.push(bar("A", Timeframe::Daily, 1, 11.0));
        store.push(bar("A", Timeframe::Daily, 2, 12.0));

        let bars = store.bars("A", Timeframe::Daily).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars.front().unwrap().close, 11.0);
    }

    #[test]
    fn test_instruments() {
        let mut store = BarStore::new(4);
        store.push(bar("B", Timeframe::Daily, 0, 1.0));
        store.push(bar("A", Timeframe::Daily, 0, 1.0));
        store.push(bar("A", Timeframe::Weekly, 0, 1.0));

        assert_eq!(store.instruments(), vec!["A", "B"]);
    }
}
