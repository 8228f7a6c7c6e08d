//! Order gateway implementations.
//!
//! The live broker integration is an external collaborator; this crate
//! ships the simulated gateway used for paper sessions and tests.

mod paper;

pub use paper::{PaperFill, PaperGateway};
