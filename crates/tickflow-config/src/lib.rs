//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, EngineSettings, LoggingConfig, PaperSettings, RiskSettings,
    SessionSettings, ValidatorSettings,
};

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from file and environment.
///
/// Environment variables use the `TICKFLOW__` prefix with `__` separators,
/// e.g. `TICKFLOW__RISK__CAPITAL=250000`.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TICKFLOW")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

/// Check cross-field constraints the type system cannot.
pub fn validate(config: &AppConfig) -> Result<(), SettingsError> {
    if config.risk.capital <= Decimal::ZERO {
        return Err(SettingsError::Invalid("risk.capital must be positive".to_string()));
    }
    if config.risk.daily_risk_fraction <= Decimal::ZERO || config.risk.daily_risk_fraction >= Decimal::ONE {
        return Err(SettingsError::Invalid(
            "risk.daily_risk_fraction must be in (0, 1)".to_string(),
        ));
    }
    if config.risk.planned_trades_per_day == 0 {
        return Err(SettingsError::Invalid(
            "risk.planned_trades_per_day must be at least 1".to_string(),
        ));
    }
    if config.engine.ma_windows.is_empty() {
        return Err(SettingsError::Invalid(
            "engine.ma_windows must not be empty".to_string(),
        ));
    }
    if config.engine.queue_depth == 0 || config.engine.bar_archive == 0 {
        return Err(SettingsError::Invalid(
            "engine.queue_depth and engine.bar_archive must be positive".to_string(),
        ));
    }

    let open = config.session.open_time().map_err(SettingsError::Invalid)?;
    let close = config.session.close_time().map_err(SettingsError::Invalid)?;
    let entry = config
        .session
        .entry_window_time()
        .map_err(SettingsError::Invalid)?;
    if open >= close {
        return Err(SettingsError::Invalid(
            "session.open must precede session.close".to_string(),
        ));
    }
    if entry < open || entry > close {
        return Err(SettingsError::Invalid(
            "session.entry_window_open must fall inside the session".to_string(),
        ));
    }

    Ok(())
}
