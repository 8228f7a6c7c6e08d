//! Incremental multi-timeframe indicators.
//!
//! Bounded-memory rolling statistics over closed bars:
//! - A fixed-capacity ring buffer sized by the longest configured window
//! - O(1) running-sum moving averages with explicit warm-up state
//! - The per-(instrument, timeframe) engine feeding evaluation snapshots

pub mod engine;
pub mod moving_average;
pub mod ring;

pub use engine::IndicatorEngine;
pub use moving_average::{MovingAverageSet, RollingMean};
pub use ring::RingBuffer;
