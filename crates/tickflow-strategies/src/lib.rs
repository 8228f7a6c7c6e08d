//! Built-in setup validators.
//!
//! The production predicate is supplied externally through the
//! `SetupValidator` trait; these illustrative validators exercise the same
//! contract and back the paper/replay workflow.

mod breakout;
mod ma_alignment;
mod registry;

pub use breakout::{BreakoutConfig, BreakoutValidator};
pub use ma_alignment::{MaAlignmentConfig, MaAlignmentValidator};
pub use registry::{ValidatorInfo, ValidatorRegistry};
