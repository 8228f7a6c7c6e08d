//! Prior-day breakout validator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use tickflow_core::error::ValidatorError;
use tickflow_core::traits::SetupValidator;
use tickflow_core::types::{Direction, EvalSnapshot, Setup, Timeframe};

/// Configuration for [`BreakoutValidator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakoutConfig {
    /// Daily moving-average window used as a trend filter
    pub trend_window: usize,
    /// Minimum session volume before a setup is considered
    pub min_volume: f64,
    /// Target distance as a multiple of the stop distance
    pub reward_multiple: Decimal,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            trend_window: 50,
            min_volume: 100_000.0,
            reward_multiple: dec!(2),
        }
    }
}

/// Long setups when price clears the previous daily high while trading
/// above a trend filter average. The stop goes under the previous daily
/// low; the target is a reward multiple of that distance.
pub struct BreakoutValidator {
    config: BreakoutConfig,
}

impl BreakoutValidator {
    /// Create a validator with the given configuration.
    pub fn new(config: BreakoutConfig) -> Result<Self, ValidatorError> {
        if config.trend_window == 0 {
            return Err(ValidatorError::InvalidConfig(
                "trend window must be greater than 0".to_string(),
            ));
        }
        if config.reward_multiple <= Decimal::ZERO {
            return Err(ValidatorError::InvalidConfig(
                "reward multiple must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }
}

impl SetupValidator for BreakoutValidator {
    fn name(&self) -> &str {
        "breakout"
    }

    fn evaluate(
        &self,
        snapshot: &EvalSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<Setup>, ValidatorError> {
        let Some(daily) = snapshot.timeframe(Timeframe::Daily) else {
            return Ok(None);
        };
        let Some(trend_ma) = daily.ma_ready(self.config.trend_window) else {
            return Ok(None);
        };
        let Some(prev) = &daily.last_closed else {
            return Ok(None);
        };
        let Some(session) = &snapshot.session_bar else {
            return Ok(None);
        };

        let ltp = snapshot.last_price;
        let broke_out = ltp > prev.high;
        let in_trend = ltp > trend_ma;
        let has_volume = session.volume > self.config.min_volume;

        if !(broke_out && in_trend && has_volume) {
            return Ok(None);
        }

        let reference_price = Decimal::try_from(ltp)
            .map_err(|e| ValidatorError::Evaluation(format!("price {} not representable: {}", ltp, e)))?;
        let proposed_stop = Decimal::try_from(prev.low)
            .map_err(|e| ValidatorError::Evaluation(format!("stop {} not representable: {}", prev.low, e)))?;
        if proposed_stop >= reference_price {
            // Degenerate previous bar; no sane stop below the entry.
            return Ok(None);
        }
        let distance = reference_price - proposed_stop;

        Ok(Some(Setup {
            instrument_id: snapshot.instrument_id.clone(),
            timestamp: now,
            direction: Direction::Long,
            reference_price,
            proposed_stop,
            proposed_target: reference_price + distance * self.config.reward_multiple,
            validator: self.name().to_string(),
        }))
    }

    fn required_bars(&self) -> usize {
        self.config.trend_window
    }

    fn description(&self) -> &str {
        "Long entries on a break of the previous daily high above a trend filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tickflow_core::types::{Bar, IndicatorValue, Tick, TimeframeSnapshot};

    fn snapshot(ltp: f64, prev_high: f64, prev_low: f64, trend_ma: f64) -> EvalSnapshot {
        let prev_tick = Tick::new("TEST", prev_high, 1.0, 0, 1);
        let mut prev = Bar::open_from_tick(&prev_tick, Timeframe::Daily, 0, 86_400_000);
        prev.low = prev_low;
        prev.high = prev_high;

        let session_tick = Tick::new("TEST", ltp, 500_000.0, 86_400_000, 2);
        let session = Bar::open_from_tick(&session_tick, Timeframe::Daily, 86_400_000, 172_800_000);

        let mut averages = BTreeMap::new();
        averages.insert(50, IndicatorValue::Ready { value: trend_ma });

        let mut timeframes = BTreeMap::new();
        timeframes.insert(
            Timeframe::Daily,
            TimeframeSnapshot {
                last_closed: Some(prev),
                bars_seen: 60,
                averages,
            },
        );

        EvalSnapshot {
            instrument_id: "TEST".to_string(),
            evaluated_at: Utc::now(),
            last_price: ltp,
            session_bar: Some(session),
            timeframes,
        }
    }

    fn validator() -> BreakoutValidator {
        BreakoutValidator::new(BreakoutConfig::default()).unwrap()
    }

    #[test]
    fn test_breakout_setup() {
        let snap = snapshot(106.0, 105.0, 101.0, 95.0);
        let setup = validator().evaluate(&snap, Utc::now()).unwrap().unwrap();

        assert_eq!(setup.reference_price, dec!(106));
        assert_eq!(setup.proposed_stop, dec!(101));
        assert_eq!(setup.proposed_target, dec!(116)); // 106 + 2 * 5
    }

    #[test]
    fn test_no_breakout() {
        let snap = snapshot(104.0, 105.0, 101.0, 95.0);
        assert!(validator().evaluate(&snap, Utc::now()).unwrap().is_none());
    }

    #[test]
    fn test_below_trend_filter() {
        let snap = snapshot(106.0, 105.0, 101.0, 120.0);
        assert!(validator().evaluate(&snap, Utc::now()).unwrap().is_none());
    }

    #[test]
    fn test_no_prior_bar() {
        let mut snap = snapshot(106.0, 105.0, 101.0, 95.0);
        snap.timeframes.get_mut(&Timeframe::Daily).unwrap().last_closed = None;
        assert!(validator().evaluate(&snap, Utc::now()).unwrap().is_none());
    }
}
