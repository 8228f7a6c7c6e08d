//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tickflow")]
#[command(author, version, about = "Tick-driven multi-timeframe intraday trading engine")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a recorded tick session through the paper gateway
    Replay(ReplayArgs),
    /// List available setup validators
    Validators,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Tick recording (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Validator to run (registry key)
    #[arg(short, long)]
    pub validator: Option<String>,

    /// Save the final portfolio snapshot to a file (JSON)
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Ignore the configured session window and trade around the clock
    #[arg(long)]
    pub all_day: bool,
}
