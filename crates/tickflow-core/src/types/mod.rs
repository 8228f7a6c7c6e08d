//! Core data types for the trading engine.

mod bar;
mod position;
mod setup;
mod snapshot;
mod tick;
mod timeframe;

pub use bar::Bar;
pub use position::{ExitReason, Position, PositionStatus};
pub use setup::{Direction, Setup};
pub use snapshot::{EvalSnapshot, IndicatorValue, TimeframeSnapshot};
pub use tick::Tick;
pub use timeframe::Timeframe;
