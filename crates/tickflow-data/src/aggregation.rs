//! Tick-to-bar aggregation with upward promotion.

use std::collections::HashMap;
use std::sync::Arc;

use tickflow_core::error::AggregationError;
use tickflow_core::traits::SessionCalendar;
use tickflow_core::types::{Bar, Tick, Timeframe};

/// Per-instrument aggregation state.
#[derive(Debug, Default)]
struct InstrumentAgg {
    last_seq: Option<u64>,
    daily: Option<Bar>,
    weekly: Option<Bar>,
    monthly: Option<Bar>,
}

impl InstrumentAgg {
    fn slot(&mut self, timeframe: Timeframe) -> &mut Option<Bar> {
        match timeframe {
            Timeframe::Daily => &mut self.daily,
            Timeframe::Weekly => &mut self.weekly,
            Timeframe::Monthly => &mut self.monthly,
        }
    }
}

/// Consumes ticks, maintains in-progress bars, and promotes closed bars
/// upward: tick → daily → weekly → monthly.
///
/// Higher-timeframe bars are built exclusively by folding the closed bars
/// of the timeframe below them (the combine law), never from raw ticks.
/// Period boundaries come from the injected `SessionCalendar`.
pub struct AggregationScheduler {
    calendar: Arc<dyn SessionCalendar>,
    instruments: HashMap<String, InstrumentAgg>,
}

impl AggregationScheduler {
    /// Create a scheduler using the given boundary policy.
    pub fn new(calendar: Arc<dyn SessionCalendar>) -> Self {
        Self {
            calendar,
            instruments: HashMap::new(),
        }
    }

    /// Apply one tick.
    ///
    /// Returns the bars closed by this tick, finest timeframe first. A tick
    /// repeating the last applied sequence number is a no-op (reconnect
    /// replay); a strictly older one is rejected and must be dropped by the
    /// caller.
    pub fn on_tick(&mut self, tick: &Tick) -> Result<Vec<Bar>, AggregationError> {
        let state = self
            .instruments
            .entry(tick.instrument_id.clone())
            .or_default();

        if let Some(last) = state.last_seq {
            if tick.sequence_no == last {
                return Ok(Vec::new());
            }
            if tick.sequence_no < last {
                return Err(AggregationError::OutOfOrderTick {
                    instrument_id: tick.instrument_id.clone(),
                    last_applied: last,
                    received: tick.sequence_no,
                });
            }
        }
        state.last_seq = Some(tick.sequence_no);

        let mut closed = Vec::new();

        // Close the daily bar before the tick opens a new period, then close
        // any higher-timeframe bar whose period the tick has also passed.
        // Weekly and monthly boundaries always coincide with a daily
        // boundary, so the transitive checks only run here.
        let rolled_over = state
            .daily
            .as_ref()
            .map_or(false, |daily| tick.timestamp >= daily.period_end);
        if rolled_over {
            let finished = state.daily.take().unwrap();
            closed.push(finished.clone());
            Self::promote(&*self.calendar, state, &finished, &mut closed);

            for timeframe in [Timeframe::Weekly, Timeframe::Monthly] {
                let expired = state
                    .slot(timeframe)
                    .as_ref()
                    .map_or(false, |bar| tick.timestamp >= bar.period_end);
                if expired {
                    let finished = state.slot(timeframe).take().unwrap();
                    closed.push(finished.clone());
                    Self::promote(&*self.calendar, state, &finished, &mut closed);
                }
            }
        }

        match &mut state.daily {
            Some(daily) => daily.apply_tick(tick),
            None => {
                let bounds = self.calendar.period_bounds(Timeframe::Daily, tick.timestamp);
                state.daily = Some(Bar::open_from_tick(
                    tick,
                    Timeframe::Daily,
                    bounds.start,
                    bounds.end,
                ));
            }
        }

        Ok(closed)
    }

    /// Fold a closed bar into the in-progress bar one timeframe up,
    /// closing and promoting that bar first if its period rolled over.
    fn promote(
        calendar: &dyn SessionCalendar,
        state: &mut InstrumentAgg,
        finished: &Bar,
        closed: &mut Vec<Bar>,
    ) {
        let Some(coarser) = finished.timeframe.coarser() else {
            return;
        };

        let rolled_over = state
            .slot(coarser)
            .as_ref()
            .map_or(false, |current| finished.period_start >= current.period_end);
        if rolled_over {
            let rolled = state.slot(coarser).take().unwrap();
            closed.push(rolled.clone());
            Self::promote(calendar, state, &rolled, closed);
        }

        if let Some(current) = state.slot(coarser) {
            current.high = current.high.max(finished.high);
            current.low = current.low.min(finished.low);
            current.close = finished.close;
            current.volume += finished.volume;
        } else {
            let bounds = calendar.period_bounds(coarser, finished.period_start);
            *state.slot(coarser) = Some(Bar {
                instrument_id: finished.instrument_id.clone(),
                timeframe: coarser,
                period_start: bounds.start,
                period_end: bounds.end,
                open: finished.open,
                high: finished.high,
                low: finished.low,
                close: finished.close,
                volume: finished.volume,
            });
        }
    }

    /// The in-progress daily bar for an instrument, if one is open.
    pub fn in_progress_daily(&self, instrument_id: &str) -> Option<&Bar> {
        self.instruments.get(instrument_id)?.daily.as_ref()
    }

    /// Close every in-progress bar for one instrument, promoting on the way
    /// up. Used at session end and for the final shutdown snapshot.
    pub fn flush_instrument(&mut self, instrument_id: &str) -> Vec<Bar> {
        let mut closed = Vec::new();
        let Some(state) = self.instruments.get_mut(instrument_id) else {
            return closed;
        };
        if let Some(daily) = state.daily.take() {
            closed.push(daily.clone());
            Self::promote(&*self.calendar, state, &daily, &mut closed);
        }
        if let Some(weekly) = state.weekly.take() {
            closed.push(weekly.clone());
            Self::promote(&*self.calendar, state, &weekly, &mut closed);
        }
        if let Some(monthly) = state.monthly.take() {
            closed.push(monthly);
        }
        closed
    }

    /// Close every in-progress bar across all instruments.
    pub fn flush_all(&mut self) -> Vec<Bar> {
        let mut instruments: Vec<String> = self.instruments.keys().cloned().collect();
        instruments.sort_unstable();
        instruments
            .into_iter()
            .flat_map(|id| self.flush_instrument(&id))
            .collect()
    }

    /// Last applied sequence number for an instrument.
    pub fn last_sequence(&self, instrument_id: &str) -> Option<u64> {
        self.instruments.get(instrument_id)?.last_seq
    }
}
