//! Configuration structures.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub risk: RiskSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub paper: PaperSettings,
    #[serde(default)]
    pub validator: ValidatorSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tickflow".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Risk budget settings.
///
/// The daily cap is a fraction of trading capital; each trade risks an
/// equal share of it across the planned trades of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Total trading capital
    pub capital: Decimal,
    /// Fraction of capital at risk per session
    pub daily_risk_fraction: Decimal,
    /// Planned trades per session
    pub planned_trades_per_day: u32,
}

impl Default for RiskSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            capital: dec!(100000),
            daily_risk_fraction: dec!(0.01),
            planned_trades_per_day: 5,
        }
    }
}

impl RiskSettings {
    /// The session risk cap.
    pub fn daily_cap(&self) -> Decimal {
        self.capital * self.daily_risk_fraction
    }

    /// Per-trade fraction of the daily cap.
    pub fn risk_per_trade_fraction(&self) -> Decimal {
        if self.planned_trades_per_day == 0 {
            Decimal::ZERO
        } else {
            Decimal::ONE / Decimal::from(self.planned_trades_per_day)
        }
    }
}

/// Trading session window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session open, `HH:MM:SS` UTC
    pub open: String,
    /// Session close, `HH:MM:SS` UTC
    pub close: String,
    /// Start of the window in which entries are permitted
    pub entry_window_open: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            open: "09:15:00".to_string(),
            close: "15:30:00".to_string(),
            entry_window_open: "09:15:00".to_string(),
        }
    }
}

impl SessionSettings {
    fn parse(field: &str, value: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .map_err(|e| format!("session.{}: {} ({})", field, value, e))
    }

    /// Parsed session open.
    pub fn open_time(&self) -> Result<NaiveTime, String> {
        Self::parse("open", &self.open)
    }

    /// Parsed session close.
    pub fn close_time(&self) -> Result<NaiveTime, String> {
        Self::parse("close", &self.close)
    }

    /// Parsed entry-window start.
    pub fn entry_window_time(&self) -> Result<NaiveTime, String> {
        Self::parse("entry_window_open", &self.entry_window_open)
    }
}

/// Engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Moving-average windows computed per timeframe
    pub ma_windows: Vec<usize>,
    /// Closed bars archived per (instrument, timeframe)
    pub bar_archive: usize,
    /// Bounded tick queue depth per instrument worker
    pub queue_depth: usize,
    /// Exit monitor cadence in milliseconds
    pub monitor_interval_ms: u64,
    /// Order acknowledgment timeout in milliseconds
    pub ack_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ma_windows: vec![9, 50, 200],
            bar_archive: 500,
            queue_depth: 256,
            monitor_interval_ms: 1000,
            ack_timeout_ms: 5000,
        }
    }
}

/// Paper gateway simulation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSettings {
    /// Simulated slippage percentage
    pub slippage_pct: Decimal,
    /// Simulated acknowledgment latency in milliseconds
    pub latency_ms: u64,
}

impl Default for PaperSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            slippage_pct: dec!(0.05),
            latency_ms: 0,
        }
    }
}

/// Which validator to run and with what overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorSettings {
    /// Registry key of the validator
    pub name: String,
    /// Field overrides merged over the validator's defaults
    pub config: Option<serde_json::Value>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            name: "ma_alignment".to_string(),
            config: None,
        }
    }
}
