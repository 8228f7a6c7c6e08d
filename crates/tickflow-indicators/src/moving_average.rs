//! Incremental simple moving averages over a shared close buffer.

use std::collections::BTreeMap;

use tickflow_core::types::IndicatorValue;

use crate::ring::RingBuffer;

/// Running-sum state for one moving-average window.
///
/// Updated in O(1) per close: add the incoming sample, subtract the one
/// that left the window. The average is never exposed before the window is
/// full — callers get an explicit `Warmup` state instead of a partial mean.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    sum: f64,
    seen: usize,
}

impl RollingMean {
    /// Create a rolling mean over the given window length.
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "Window must be greater than 0");
        Self {
            window,
            sum: 0.0,
            seen: 0,
        }
    }

    /// Apply one incoming sample. `leaving` is the sample that drops out of
    /// this window, if the window was already full.
    pub fn push(&mut self, incoming: f64, leaving: Option<f64>) {
        self.sum += incoming;
        if let Some(old) = leaving {
            self.sum -= old;
        }
        self.seen += 1;
    }

    /// Current reading.
    pub fn value(&self) -> IndicatorValue {
        if self.seen >= self.window {
            IndicatorValue::Ready {
                value: self.sum / self.window as f64,
            }
        } else {
            IndicatorValue::Warmup {
                have: self.seen,
                need: self.window,
            }
        }
    }

    /// Window length.
    pub fn window(&self) -> usize {
        self.window
    }
}

/// A set of moving averages sharing one bounded close buffer.
///
/// The buffer capacity is the longest configured window, so memory per
/// (instrument, timeframe) is fixed regardless of how long the engine runs.
#[derive(Debug, Clone)]
pub struct MovingAverageSet {
    ring: RingBuffer,
    means: Vec<RollingMean>,
}

impl MovingAverageSet {
    /// Create a set for the given window lengths.
    pub fn new(windows: &[usize]) -> Self {
        let capacity = windows.iter().copied().max().unwrap_or(1);
        Self {
            ring: RingBuffer::new(capacity),
            means: windows.iter().map(|&w| RollingMean::new(w)).collect(),
        }
    }

    /// Fold in one closed-bar close.
    pub fn push(&mut self, close: f64) {
        for mean in &mut self.means {
            // The oldest sample of a full window is window-1 back from the
            // newest; it leaves when the new close arrives.
            let leaving = if mean.seen >= mean.window {
                self.ring.latest(mean.window - 1)
            } else {
                None
            };
            mean.push(close, leaving);
        }
        self.ring.push(close);
    }

    /// Reading for one window length.
    pub fn value(&self, window: usize) -> Option<IndicatorValue> {
        self.means
            .iter()
            .find(|m| m.window == window)
            .map(|m| m.value())
    }

    /// All readings, keyed by window length.
    pub fn values(&self) -> BTreeMap<usize, IndicatorValue> {
        self.means.iter().map(|m| (m.window, m.value())).collect()
    }

    /// Number of closes folded in so far.
    pub fn samples_seen(&self) -> usize {
        self.means.first().map(|m| m.seen).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference implementation: arithmetic mean recomputed from scratch.
    fn mean_from_scratch(data: &[f64], window: usize) -> Option<f64> {
        if data.len() < window {
            return None;
        }
        let tail = &data[data.len() - window..];
        Some(tail.iter().sum::<f64>() / window as f64)
    }

    #[test]
    fn test_warmup_is_explicit() {
        let mut set = MovingAverageSet::new(&[3]);
        set.push(1.0);
        set.push(2.0);

        match set.value(3).unwrap() {
            IndicatorValue::Warmup { have, need } => {
                assert_eq!(have, 2);
                assert_eq!(need, 3);
            }
            IndicatorValue::Ready { .. } => panic!("must not report a partial mean"),
        }
    }

    #[test]
    fn test_ready_after_window_fills() {
        let mut set = MovingAverageSet::new(&[3]);
        for v in [1.0, 2.0, 3.0] {
            set.push(v);
        }
        assert_eq!(set.value(3).unwrap().ready(), Some(2.0));
    }

    #[test]
    fn test_incremental_matches_from_scratch() {
        let windows = [3usize, 9, 20];
        let mut set = MovingAverageSet::new(&windows);
        let data: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 15.0 + (i as f64) * 0.05)
            .collect();

        for (i, &close) in data.iter().enumerate() {
            set.push(close);
            for &w in &windows {
                let expected = mean_from_scratch(&data[..=i], w);
                let got = set.value(w).unwrap().ready();
                match (expected, got) {
                    (Some(e), Some(g)) => assert!(
                        (e - g).abs() < 1e-9,
                        "window {} at sample {}: {} vs {}",
                        w,
                        i,
                        e,
                        g
                    ),
                    (None, None) => {}
                    _ => panic!("warm-up state disagrees at sample {} window {}", i, w),
                }
            }
        }
    }

    #[test]
    fn test_unknown_window() {
        let set = MovingAverageSet::new(&[9]);
        assert!(set.value(50).is_none());
    }
}
