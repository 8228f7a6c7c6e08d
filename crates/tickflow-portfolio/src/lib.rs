//! Portfolio orchestration: the single authority over position lifecycle
//! and the shared daily risk budget.

mod orchestrator;

pub use orchestrator::{PortfolioOrchestrator, PortfolioSnapshot};
