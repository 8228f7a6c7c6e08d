//! Risk management: the shared daily risk budget and position sizing.

mod budget;
mod sizer;

pub use budget::RiskBudget;
pub use sizer::{PositionSizer, RejectReason, SizingDecision};
