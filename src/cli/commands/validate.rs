//! Validate configuration file.

use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = tickflow_config::load_config(config_path)
        .with_context(|| format!("configuration at {} is invalid", config_path.display()))?;

    println!("Configuration OK: {}", config_path.display());
    println!("  app:              {} ({})", config.app.name, config.app.environment);
    println!("  capital:          {}", config.risk.capital);
    println!(
        "  daily risk cap:   {} ({} planned trades)",
        config.risk.daily_cap(),
        config.risk.planned_trades_per_day
    );
    println!(
        "  session:          {} - {} (entries from {})",
        config.session.open, config.session.close, config.session.entry_window_open
    );
    println!("  validator:        {}", config.validator.name);
    println!("  ma windows:       {:?}", config.engine.ma_windows);

    Ok(())
}
