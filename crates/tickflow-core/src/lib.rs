//! Core types and traits for the tickflow trading engine.
//!
//! This crate provides the foundational building blocks:
//! - Market data types (Tick, Bar, Timeframe)
//! - Setup, position, and lifecycle types
//! - Evaluation snapshots with explicit indicator warm-up state
//! - Trait seams for validators, order gateways, and session calendars

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TickflowError, TickflowResult};
pub use traits::*;
pub use types::*;
