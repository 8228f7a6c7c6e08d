//! Moving-average alignment validator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use tickflow_core::error::ValidatorError;
use tickflow_core::traits::SetupValidator;
use tickflow_core::types::{Direction, EvalSnapshot, Setup, Timeframe};

/// Configuration for [`MaAlignmentValidator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaAlignmentConfig {
    /// Short daily moving-average window
    pub short_window: usize,
    /// Long daily moving-average window
    pub long_window: usize,
    /// Minimum session volume before a setup is considered
    pub min_volume: f64,
    /// Minimum close-over-open gain for a green session candle
    pub min_green_pct: f64,
    /// Stop distance as a fraction of the entry price
    pub stop_pct: Decimal,
    /// Target distance as a fraction of the entry price
    pub target_pct: Decimal,
}

impl Default for MaAlignmentConfig {
    fn default() -> Self {
        Self {
            short_window: 9,
            long_window: 200,
            min_volume: 100_000.0,
            min_green_pct: 0.005,
            stop_pct: dec!(0.02),
            target_pct: dec!(0.04),
        }
    }
}

/// Long setups when price trades above both daily moving averages on a
/// green session candle with sufficient volume.
///
/// An illustrative validator, not a tuned strategy: it demonstrates the
/// snapshot contract, including treating a warming-up average as "no
/// setup".
pub struct MaAlignmentValidator {
    config: MaAlignmentConfig,
}

impl MaAlignmentValidator {
    /// Create a validator with the given configuration.
    pub fn new(config: MaAlignmentConfig) -> Result<Self, ValidatorError> {
        if config.short_window == 0 || config.long_window == 0 {
            return Err(ValidatorError::InvalidConfig(
                "windows must be greater than 0".to_string(),
            ));
        }
        if config.short_window >= config.long_window {
            return Err(ValidatorError::InvalidConfig(format!(
                "short window {} must be below long window {}",
                config.short_window, config.long_window
            )));
        }
        if config.stop_pct <= Decimal::ZERO || config.target_pct <= Decimal::ZERO {
            return Err(ValidatorError::InvalidConfig(
                "stop and target fractions must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }
}

impl SetupValidator for MaAlignmentValidator {
    fn name(&self) -> &str {
        "ma_alignment"
    }

    fn evaluate(
        &self,
        snapshot: &EvalSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<Setup>, ValidatorError> {
        let Some(daily) = snapshot.timeframe(Timeframe::Daily) else {
            return Ok(None);
        };

        // Warm-up means no setup, never a degraded signal.
        let (Some(short_ma), Some(long_ma)) = (
            daily.ma_ready(self.config.short_window),
            daily.ma_ready(self.config.long_window),
        ) else {
            return Ok(None);
        };

        let Some(session) = &snapshot.session_bar else {
            return Ok(None);
        };

        let ltp = snapshot.last_price;
        let above_mas = ltp > short_ma && ltp > long_ma;
        let has_volume = session.volume > self.config.min_volume;
        let is_green = session.open > 0.0 && (ltp - session.open) / session.open > self.config.min_green_pct;

        if !(above_mas && has_volume && is_green) {
            return Ok(None);
        }

        let reference_price = Decimal::try_from(ltp)
            .map_err(|e| ValidatorError::Evaluation(format!("price {} not representable: {}", ltp, e)))?;

        Ok(Some(Setup {
            instrument_id: snapshot.instrument_id.clone(),
            timestamp: now,
            direction: Direction::Long,
            reference_price,
            proposed_stop: reference_price * (dec!(1) - self.config.stop_pct),
            proposed_target: reference_price * (dec!(1) + self.config.target_pct),
            validator: self.name().to_string(),
        }))
    }

    fn required_bars(&self) -> usize {
        self.config.long_window
    }

    fn description(&self) -> &str {
        "Long entries above aligned daily moving averages on a green, high-volume session"
    }
}
