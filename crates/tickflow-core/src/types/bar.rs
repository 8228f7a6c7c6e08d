//! OHLCV bars and the combine law for timeframe promotion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Tick, Timeframe};

/// An OHLCV bar for one instrument over one period at one timeframe.
///
/// A bar is in-progress until its period ends; only the aggregation
/// scheduler mutates it. Once emitted as closed it is treated as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument identifier
    pub instrument_id: String,
    /// Aggregation timeframe
    pub timeframe: Timeframe,
    /// Period start, Unix millis, inclusive
    pub period_start: i64,
    /// Period end, Unix millis, exclusive
    pub period_end: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Total volume
    pub volume: f64,
}

impl Bar {
    /// Open a new bar from the first tick of a period.
    pub fn open_from_tick(tick: &Tick, timeframe: Timeframe, period_start: i64, period_end: i64) -> Self {
        Self {
            instrument_id: tick.instrument_id.clone(),
            timeframe,
            period_start,
            period_end,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume: tick.volume,
        }
    }

    /// Fold another tick into an in-progress bar.
    pub fn apply_tick(&mut self, tick: &Tick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume += tick.volume;
    }

    /// Combine consecutive lower-timeframe bars into one higher-timeframe bar.
    ///
    /// open = first open, close = last close, high = max, low = min,
    /// volume = sum. Higher-timeframe bars are only ever built this way,
    /// never re-derived from raw ticks.
    pub fn combine(timeframe: Timeframe, period_start: i64, period_end: i64, parts: &[Bar]) -> Option<Bar> {
        let first = parts.first()?;
        let last = parts.last()?;

        let mut high = f64::MIN;
        let mut low = f64::MAX;
        let mut volume = 0.0;
        for part in parts {
            high = high.max(part.high);
            low = low.min(part.low);
            volume += part.volume;
        }

        Some(Bar {
            instrument_id: first.instrument_id.clone(),
            timeframe,
            period_start,
            period_end,
            open: first.open,
            high,
            low,
            close: last.close,
            volume,
        })
    }

    /// The bar's price range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check if the bar closed above its open.
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check if the bar closed below its open.
    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Close-over-open change as a fraction of the open.
    pub fn change_pct(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            (self.close - self.open) / self.open
        }
    }

    /// Period start as a DateTime.
    pub fn start_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.period_start)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(price: f64, volume: f64, ts: i64) -> Tick {
        Tick::new("TEST", price, volume, ts, 0)
    }

    #[test]
    fn test_open_and_apply() {
        let mut bar = Bar::open_from_tick(&tick(100.0, 10.0, 0), Timeframe::Daily, 0, 86_400_000);
        bar.apply_tick(&tick(105.0, 5.0, 1000));
        bar.apply_tick(&tick(98.0, 2.0, 2000));

        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.high, 105.0);
        assert_eq!(bar.low, 98.0);
        assert_eq!(bar.close, 98.0);
        assert_eq!(bar.volume, 17.0);
    }

    #[test]
    fn test_combine_law() {
        let mut a = Bar::open_from_tick(&tick(100.0, 10.0, 0), Timeframe::Daily, 0, 100);
        a.apply_tick(&tick(110.0, 5.0, 50));
        let mut b = Bar::open_from_tick(&tick(108.0, 3.0, 100), Timeframe::Daily, 100, 200);
        b.apply_tick(&tick(95.0, 7.0, 150));

        let weekly = Bar::combine(Timeframe::Weekly, 0, 200, &[a, b]).unwrap();
        assert_eq!(weekly.open, 100.0);
        assert_eq!(weekly.close, 95.0);
        assert_eq!(weekly.high, 110.0);
        assert_eq!(weekly.low, 95.0);
        assert_eq!(weekly.volume, 25.0);
        assert_eq!(weekly.timeframe, Timeframe::Weekly);
    }

    #[test]
    fn test_combine_empty() {
        assert!(Bar::combine(Timeframe::Weekly, 0, 100, &[]).is_none());
    }

    #[test]
    fn test_bullish_bearish() {
        let mut bar = Bar::open_from_tick(&tick(100.0, 1.0, 0), Timeframe::Daily, 0, 100);
        bar.apply_tick(&tick(101.0, 1.0, 10));
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!((bar.change_pct() - 0.01).abs() < 1e-12);
    }
}
